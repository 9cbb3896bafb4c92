use {
    super::{
        EntityRecord,
        EntityStore,
    },
    crate::kernel::{
        entities::{
            EntityKey,
            Value,
        },
        error::CacheError,
    },
    std::sync::Arc,
    time::OffsetDateTime,
};

impl EntityStore {
    #[tracing::instrument(skip_all, fields(namespace, key))]
    pub async fn put_entity_record(
        &self,
        namespace: &str,
        key: EntityKey,
        value: Value,
    ) -> Result<Arc<EntityRecord>, CacheError> {
        tracing::Span::current().record("namespace", namespace);
        tracing::Span::current().record("key", key.as_str());
        let namespace = self.namespace(namespace)?;
        let guard = namespace.lock.acquire().await;
        let record = namespace.write(&guard, key, value, self.next_version());
        guard.release();
        tracing::debug!(version = record.version, "Entity record stored");
        Ok(record)
    }

    /// Stores a freshly fetched value unless the key was written or evicted after
    /// `observed_version` was read (see [`EntityStore::entity_version`]).
    ///
    /// A newer record wins and is returned unchanged. After an eviction nothing is stored and
    /// the fetched value is returned in a record that is not cached.
    #[tracing::instrument(skip_all, fields(namespace, key))]
    pub async fn refresh_entity_record(
        &self,
        namespace: &str,
        key: EntityKey,
        value: Value,
        observed_version: u64,
    ) -> Result<Arc<EntityRecord>, CacheError> {
        tracing::Span::current().record("namespace", namespace);
        tracing::Span::current().record("key", key.as_str());
        let namespace = self.namespace(namespace)?;
        let guard = namespace.lock.acquire().await;
        let current_version = namespace.version_of(&key);
        if current_version > observed_version {
            if let Some(current) = namespace.get(&key) {
                tracing::debug!(
                    version = current.version,
                    "Record updated during fetch, keeping newer record"
                );
                return Ok(current);
            }
            tracing::debug!(
                version = current_version,
                "Record evicted during fetch, fetched value not cached"
            );
            return Ok(Arc::new(EntityRecord {
                key,
                value,
                updated_at: OffsetDateTime::now_utc(),
                version: observed_version,
            }));
        }
        let record = namespace.write(&guard, key, value, self.next_version());
        drop(guard);
        Ok(record)
    }
}
