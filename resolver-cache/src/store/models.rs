use {
    crate::kernel::entities::{
        EntityKey,
        Namespace,
        Value,
    },
    resolver_cache_api_types as api,
    std::time::Duration,
    time::OffsetDateTime,
};

/// A cached value and its freshness marker. Records are immutable once stored; an update
/// stores a new record in place of the old one.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub key:        EntityKey,
    pub value:      Value,
    pub updated_at: OffsetDateTime,
    pub version:    u64,
}

impl EntityRecord {
    pub fn is_fresh(&self, ttl: Duration, now: OffsetDateTime) -> bool {
        now - self.updated_at < ttl
    }

    pub fn into_api(self, namespace: Namespace) -> api::EntityRecord {
        api::EntityRecord {
            namespace,
            key: self.key,
            value: self.value,
            updated_at: self.updated_at,
            version: self.version,
        }
    }
}

/// Effect of an update event on the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Replaced,
    Merged,
    Evicted,
    /// Nothing changed, with the reason.
    Ignored(&'static str),
}

impl UpdateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateOutcome::Replaced => "replaced",
            UpdateOutcome::Merged => "merged",
            UpdateOutcome::Evicted => "evicted",
            UpdateOutcome::Ignored(_) => "ignored",
        }
    }
}
