use {
    crate::{
        event::entities::UpdateEvent,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        store::EntityStore,
    },
    axum_prometheus::metrics,
    std::{
        sync::{
            atomic::Ordering,
            Arc,
        },
        time::Duration,
    },
    time::OffsetDateTime,
    tokio::sync::broadcast::{
        error::RecvError,
        Receiver,
    },
};

/// Applies every published update event to the store until shutdown or until the bus closes.
///
/// A failing event is logged and skipped. When the loop lags behind the bus, the events it
/// missed are unknown, so every cached record is evicted and refetched on its next read.
pub async fn run_update_event_loop(
    store: Arc<EntityStore>,
    mut receiver: Receiver<UpdateEvent>,
) -> anyhow::Result<()> {
    tracing::info!("Starting update event loop...");
    let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);

    while !SHOULD_EXIT.load(Ordering::Acquire) {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(event) => handle_update_event(&store, event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::error!(skipped, "Update event loop lagged behind, events were dropped");
                    metrics::counter!("update_events_lagged_total").increment(skipped);
                    let removed = store.remove_all_entity_records().await;
                    tracing::warn!(removed, "Evicted all entity records after lag");
                }
                Err(RecvError::Closed) => {
                    tracing::warn!("Update event bus closed");
                    break;
                }
            },
            _ = exit_check_interval.tick() => {}
        }
    }
    tracing::info!("Shutting down update event loop...");
    Ok(())
}

#[tracing::instrument(skip_all, fields(kind, namespace, key))]
async fn handle_update_event(store: &EntityStore, event: UpdateEvent) {
    let span = tracing::Span::current();
    span.record("kind", event.kind.as_ref());
    span.record("namespace", event.namespace.as_str());
    span.record("key", event.key.as_str());

    let namespace = event.namespace.clone();
    let kind = event.kind.as_ref().to_string();
    let result = match store.apply_update_event(event).await {
        Ok(outcome) => outcome.label(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to apply update event");
            "error"
        }
    };
    metrics::counter!(
        "update_events_total",
        &[
            ("namespace", namespace),
            ("kind", kind),
            ("result", result.to_string()),
        ]
    )
    .increment(1);
}

/// Periodically removes records older than their namespace's `evict_after` and refreshes the
/// record count gauges.
pub async fn run_expiry_loop(store: Arc<EntityStore>, interval: Duration) -> anyhow::Result<()> {
    tracing::info!(interval = ?interval, "Starting expiry loop...");
    let mut expiry_interval = tokio::time::interval(interval);
    let mut exit_check_interval = tokio::time::interval(EXIT_CHECK_INTERVAL);

    while !SHOULD_EXIT.load(Ordering::Acquire) {
        tokio::select! {
            _ = expiry_interval.tick() => {
                let removed = store
                    .remove_expired_entity_records(OffsetDateTime::now_utc())
                    .await;
                if removed > 0 {
                    tracing::info!(removed, "Removed expired entity records");
                }
                store.update_metrics();
            }
            _ = exit_check_interval.tick() => {}
        }
    }
    tracing::info!("Shutting down expiry loop...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            event::{
                entities::UpdateEventKind,
                EventBus,
            },
            store::tests::new_test_store,
        },
        serde_json::json,
    };

    fn pair_event(key: &str, payload: Option<serde_json::Value>) -> UpdateEvent {
        UpdateEvent {
            kind:      UpdateEventKind::Pair,
            namespace: "pairs".to_string(),
            key:       key.to_string(),
            payload,
        }
    }

    #[tokio::test]
    async fn test_update_event_loop_applies_events_in_order() {
        let store = Arc::new(new_test_store());
        let bus = EventBus::new(16);
        let receiver = bus.subscribe();
        let worker = tokio::spawn(run_update_event_loop(store.clone(), receiver));

        bus.publish(pair_event("erd1", Some(json!({"state": "Active"}))))
            .unwrap();
        // Unknown namespace: logged, then the loop moves on.
        bus.publish(UpdateEvent {
            namespace: "farms".to_string(),
            ..pair_event("erd1", None)
        })
        .unwrap();
        bus.publish(pair_event("erd1", Some(json!({"state": "Paused"}))))
            .unwrap();
        bus.publish(pair_event("erd2", Some(json!({"state": "Active"}))))
            .unwrap();
        drop(bus);

        worker.await.unwrap().unwrap();
        let record = store.get_entity_record("pairs", "erd1").unwrap().unwrap();
        assert_eq!(record.value, json!({"state": "Paused"}));
        assert!(store.get_entity_record("pairs", "erd2").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_event_loop_evicts_everything_on_lag() {
        let store = Arc::new(new_test_store());
        store
            .put_entity_record("pairs", "erd9".to_string(), json!({"state": "Active"}))
            .await
            .unwrap();
        store
            .put_entity_record("tokens", "MEX-455c57".to_string(), json!({"decimals": 18}))
            .await
            .unwrap();
        let bus = EventBus::new(2);
        let receiver = bus.subscribe();
        for index in 0..5 {
            bus.publish(pair_event("erd1", Some(json!({"index": index}))))
                .unwrap();
        }
        drop(bus);

        run_update_event_loop(store.clone(), receiver).await.unwrap();
        // Events received after the lag are still applied.
        let record = store.get_entity_record("pairs", "erd1").unwrap().unwrap();
        assert_eq!(record.value, json!({"index": 4}));
        // Records the dropped events may have addressed are gone.
        assert_eq!(store.get_entity_record("pairs", "erd9").unwrap(), None);
        assert_eq!(store.get_entity_record("tokens", "MEX-455c57").unwrap(), None);
    }
}
