use {
    super::{
        EntityRecord,
        EntityStore,
    },
    crate::kernel::error::CacheError,
    std::sync::Arc,
};

impl EntityStore {
    /// Pure lookup: a miss never triggers a fetch.
    pub fn get_entity_record(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Arc<EntityRecord>>, CacheError> {
        Ok(self.namespace(namespace)?.get(key))
    }

    /// Version of the last write or eviction of `key`. Read it before fetching a value and
    /// hand it to [`EntityStore::refresh_entity_record`].
    pub fn entity_version(&self, namespace: &str, key: &str) -> Result<u64, CacheError> {
        Ok(self.namespace(namespace)?.version_of(key))
    }
}
