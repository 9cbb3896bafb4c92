use {
    super::EntityStore,
    time::OffsetDateTime,
};

impl EntityStore {
    /// Evicts records older than their namespace's `evict_after`, if configured, and forgets
    /// evictions older than the tombstone retention. Returns the number of evicted records.
    pub async fn remove_expired_entity_records(&self, now: OffsetDateTime) -> usize {
        let mut removed = 0;
        for namespace in self.namespaces() {
            if !namespace.tombstones.is_empty() {
                let guard = namespace.lock.acquire().await;
                namespace.prune_tombstones(&guard, now - self.tombstone_retention);
            }
            let Some(evict_after) = namespace.config.evict_after else {
                continue;
            };
            let expired: Vec<String> = namespace
                .records
                .iter()
                .filter(|entry| !entry.value().is_fresh(evict_after, now))
                .map(|entry| entry.key().clone())
                .collect();
            if expired.is_empty() {
                continue;
            }

            let guard = namespace.lock.acquire().await;
            for key in expired {
                // Re-checked under the lock: the record may have been refreshed meanwhile.
                if namespace
                    .get(&key)
                    .is_some_and(|record| !record.is_fresh(evict_after, now))
                {
                    namespace.evict(&guard, &key, self.next_version());
                    removed += 1;
                }
            }
            drop(guard);
            tracing::debug!(namespace = namespace.name(), "Expired entity records evicted");
        }
        removed
    }
}
