use {
    super::{
        EntityRecord,
        EntityStore,
    },
    crate::kernel::error::CacheError,
    std::sync::Arc,
};

impl EntityStore {
    #[tracing::instrument(skip_all, fields(namespace, key))]
    pub async fn remove_entity_record(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Arc<EntityRecord>>, CacheError> {
        tracing::Span::current().record("namespace", namespace);
        tracing::Span::current().record("key", key);
        let namespace = self.namespace(namespace)?;
        let guard = namespace.lock.acquire().await;
        let removed = namespace.evict(&guard, key, self.next_version());
        drop(guard);
        if removed.is_some() {
            tracing::debug!("Entity record removed");
        }
        Ok(removed)
    }

    /// Evicts every record of every namespace. Fetches in flight are not stored afterwards.
    /// Returns the number of evicted records.
    pub async fn remove_all_entity_records(&self) -> usize {
        let mut removed = 0;
        for namespace in self.namespaces() {
            let guard = namespace.lock.acquire().await;
            removed += namespace.clear(&guard, self.next_version());
        }
        tracing::info!(removed, "All entity records removed");
        removed
    }
}
