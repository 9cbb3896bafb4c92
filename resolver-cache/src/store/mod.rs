use {
    crate::{
        config::NamespaceConfig,
        kernel::{
            entities::{
                EntityKey,
                Namespace,
                Value,
            },
            error::CacheError,
            lock::{
                ExclusionGuard,
                ExclusionLock,
            },
        },
    },
    axum_prometheus::metrics,
    dashmap::DashMap,
    std::{
        collections::HashMap,
        sync::{
            atomic::{
                AtomicU64,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    time::OffsetDateTime,
};

pub mod api;
mod apply_update_event;
mod get_entity_record;
mod models;
mod put_entity_record;
mod remove_entity_record;
mod remove_expired_entity_records;

pub use models::*;

pub const DEFAULT_TOMBSTONE_RETENTION: Duration = Duration::from_secs(600);

// Version of an eviction, kept so a fetch started before it cannot bring the record back.
#[derive(Debug)]
struct Tombstone {
    version:    u64,
    evicted_at: OffsetDateTime,
}

/// One cached collection.
///
/// Readers go straight to the record map and always see a whole record. Every mutation
/// runs under the namespace lock so read-modify-write updates (merges) cannot interleave.
///
/// Every mutation of a key, evictions included, moves its version forward. A refresh
/// only lands if the key's version is still the one observed before the fetch.
#[derive(Debug)]
pub struct NamespaceStore {
    pub config:      NamespaceConfig,
    records:         DashMap<EntityKey, Arc<EntityRecord>>,
    tombstones:      DashMap<EntityKey, Tombstone>,
    cleared_through: AtomicU64,
    lock:            ExclusionLock,
}

impl NamespaceStore {
    fn new(config: NamespaceConfig, lock_poll_interval: Duration) -> Self {
        Self {
            config,
            records: DashMap::new(),
            tombstones: DashMap::new(),
            cleared_through: AtomicU64::new(0),
            lock: ExclusionLock::new(lock_poll_interval),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, key: &str) -> Option<Arc<EntityRecord>> {
        self.records.get(key).map(|record| record.value().clone())
    }

    /// Version of the last mutation of `key`, whether it wrote or evicted the record.
    fn version_of(&self, key: &str) -> u64 {
        let written = self.records.get(key).map(|record| record.version);
        let evicted = self.tombstones.get(key).map(|tombstone| tombstone.version);
        written
            .into_iter()
            .chain(evicted)
            .fold(self.cleared_through.load(Ordering::SeqCst), u64::max)
    }

    // The guard argument proves the caller holds this namespace's lock.
    fn write(
        &self,
        _guard: &ExclusionGuard<'_>,
        key: EntityKey,
        value: Value,
        version: u64,
    ) -> Arc<EntityRecord> {
        let record = Arc::new(EntityRecord {
            key: key.clone(),
            value,
            updated_at: OffsetDateTime::now_utc(),
            version,
        });
        self.tombstones.remove(&key);
        self.records.insert(key, record.clone());
        record
    }

    fn evict(
        &self,
        _guard: &ExclusionGuard<'_>,
        key: &str,
        version: u64,
    ) -> Option<Arc<EntityRecord>> {
        self.tombstones.insert(
            key.to_string(),
            Tombstone {
                version,
                evicted_at: OffsetDateTime::now_utc(),
            },
        );
        self.records.remove(key).map(|(_, record)| record)
    }

    fn clear(&self, _guard: &ExclusionGuard<'_>, version: u64) -> usize {
        let removed = self.records.len();
        self.cleared_through.store(version, Ordering::SeqCst);
        self.records.clear();
        self.tombstones.clear();
        removed
    }

    fn prune_tombstones(&self, _guard: &ExclusionGuard<'_>, evicted_before: OffsetDateTime) {
        self.tombstones
            .retain(|_, tombstone| tombstone.evicted_at >= evicted_before);
    }
}

/// In-memory entity collections, one per registered namespace.
///
/// Constructed once at startup and shared by reference; the set of namespaces is fixed
/// for the lifetime of the store.
#[derive(Debug)]
pub struct EntityStore {
    namespaces:          HashMap<Namespace, NamespaceStore>,
    version:             AtomicU64,
    tombstone_retention: Duration,
}

impl EntityStore {
    pub fn new(namespaces: Vec<NamespaceConfig>, lock_poll_interval: Duration) -> Self {
        Self {
            namespaces:          namespaces
                .into_iter()
                .map(|config| {
                    (
                        config.name.clone(),
                        NamespaceStore::new(config, lock_poll_interval),
                    )
                })
                .collect(),
            version:             AtomicU64::new(0),
            tombstone_retention: DEFAULT_TOMBSTONE_RETENTION,
        }
    }

    /// How long an eviction is remembered. A fetch outliving it may store the value it read
    /// before the eviction.
    pub fn with_tombstone_retention(mut self, retention: Duration) -> Self {
        self.tombstone_retention = retention;
        self
    }

    pub fn namespace(&self, name: &str) -> Result<&NamespaceStore, CacheError> {
        self.namespaces
            .get(name)
            .ok_or_else(|| CacheError::UnknownNamespace(name.to_string()))
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceStore> {
        self.namespaces.values()
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn update_metrics(&self) {
        for namespace in self.namespaces() {
            metrics::gauge!(
                "entity_cache_records",
                &[("namespace", namespace.name().to_string())]
            )
            .set(namespace.len() as f64);
        }
    }
}
