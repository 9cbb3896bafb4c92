use {
    anyhow::anyhow,
    tokio::sync::broadcast,
};

pub mod api;
pub mod entities;

pub const DEFAULT_EVENT_CHANNEL_SIZE: usize = 1000;

/// Process-wide publish/subscribe channel for entity update events.
///
/// Events are delivered to every subscriber in publish order. A subscriber that falls more
/// than the channel size behind loses the oldest events and is told how many it missed.
pub struct EventBus {
    sender: broadcast::Sender<entities::UpdateEvent>,
}

impl EventBus {
    pub fn new(channel_size: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_size);
        Self { sender }
    }

    /// Publishes an event and returns the number of subscribers it was delivered to.
    pub fn publish(&self, event: entities::UpdateEvent) -> anyhow::Result<usize> {
        tracing::debug!(
            kind = event.kind.as_ref(),
            namespace = %event.namespace,
            key = %event.key,
            "Publishing update event"
        );
        self.sender
            .send(event)
            .map_err(|err| anyhow!("No subscriber for update event: {:?}", err.0))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<entities::UpdateEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{
            entities::{
                UpdateEvent,
                UpdateEventKind,
            },
            *,
        },
        serde_json::json,
    };

    fn event(key: &str, payload: Option<serde_json::Value>) -> UpdateEvent {
        UpdateEvent {
            kind: UpdateEventKind::Pair,
            namespace: "pairs".to_string(),
            key: key.to_string(),
            payload,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_fails() {
        let bus = EventBus::new(10);
        assert!(bus.publish(event("erd1", None)).is_err());
    }

    #[tokio::test]
    async fn test_events_are_delivered_in_order_to_every_subscriber() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let events = vec![
            event("erd1", Some(json!({"state": "Active"}))),
            event("erd1", Some(json!({"state": "Inactive"}))),
            event("erd1", None),
        ];
        for event in events.clone() {
            assert_eq!(bus.publish(event).unwrap(), 2);
        }

        for receiver in [&mut first, &mut second] {
            for expected in &events {
                assert_eq!(&receiver.recv().await.unwrap(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_notified() {
        let bus = EventBus::new(2);
        let mut receiver = bus.subscribe();
        for index in 0..4 {
            bus.publish(event(&format!("erd{}", index), None)).unwrap();
        }
        assert!(matches!(
            receiver.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
        assert_eq!(receiver.recv().await.unwrap().key, "erd2");
    }
}
