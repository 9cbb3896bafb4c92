use {
    super::{
        EntityStore,
        UpdateOutcome,
    },
    crate::{
        event::entities::{
            UpdateEvent,
            UpdatePolicy,
        },
        kernel::{
            entities::Value,
            error::CacheError,
        },
    },
};

/// Recursively merges `patch` into `target`. Nested objects are merged field by field,
/// every other value in the patch overwrites the target's.
fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (field, value) in patch {
                let nested = value.is_object() && target.get(&field).is_some_and(Value::is_object);
                if !nested {
                    target.insert(field, value);
                } else if let Some(existing) = target.get_mut(&field) {
                    deep_merge(existing, value);
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

enum Action {
    Replace(Value),
    Merge(Value),
    Evict,
}

impl EntityStore {
    /// Applies an update event according to the policy registered for its kind in the
    /// addressed namespace. An event without payload always evicts.
    #[tracing::instrument(skip_all, fields(namespace, key, kind))]
    pub async fn apply_update_event(
        &self,
        event: UpdateEvent,
    ) -> Result<UpdateOutcome, CacheError> {
        let UpdateEvent {
            kind,
            namespace: namespace_name,
            key,
            payload,
        } = event;
        let span = tracing::Span::current();
        span.record("namespace", namespace_name.as_str());
        span.record("key", key.as_str());
        span.record("kind", kind.as_ref());

        let namespace = self.namespace(&namespace_name)?;
        let action = match (payload, namespace.config.event_policies.get(&kind)) {
            (None, _) | (Some(_), Some(UpdatePolicy::Evict)) => Action::Evict,
            (Some(payload), Some(UpdatePolicy::Replace)) => Action::Replace(payload),
            (Some(payload), Some(UpdatePolicy::Merge)) => Action::Merge(payload),
            (Some(_), None) => {
                tracing::warn!("No update policy registered for event kind");
                return Ok(UpdateOutcome::Ignored("no policy for event kind"));
            }
        };

        let guard = namespace.lock.acquire().await;
        let outcome = match action {
            Action::Evict => {
                namespace.evict(&guard, &key, self.next_version());
                UpdateOutcome::Evicted
            }
            Action::Replace(payload) => {
                namespace.write(&guard, key, payload, self.next_version());
                UpdateOutcome::Replaced
            }
            Action::Merge(payload) => {
                if !payload.is_object() {
                    return Err(CacheError::InvalidPayload {
                        namespace: namespace_name,
                        key,
                        reason: "merge payload must be an object".to_string(),
                    });
                }
                match namespace.get(&key) {
                    // A partial payload never creates a record.
                    None => UpdateOutcome::Ignored("record not cached"),
                    Some(existing) if !existing.value.is_object() => {
                        return Err(CacheError::InvalidPayload {
                            namespace: namespace_name,
                            key,
                            reason: "cannot merge into a non-object record".to_string(),
                        });
                    }
                    Some(existing) => {
                        let mut value = existing.value.clone();
                        deep_merge(&mut value, payload);
                        namespace.write(&guard, key, value, self.next_version());
                        UpdateOutcome::Merged
                    }
                }
            }
        };
        drop(guard);

        tracing::debug!(outcome = ?outcome, "Update event applied");
        Ok(outcome)
    }
}
