use {
    crate::kernel::entities::{
        EntityKey,
        Namespace,
        Value,
    },
    resolver_cache_api_types::event as api,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
};

#[derive(Serialize, Deserialize, AsRefStr, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateEventKind {
    Pair,
    PairEsdtTokens,
    Token,
}

/// How an update event of a given kind mutates its namespace.
#[derive(Serialize, Deserialize, AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpdatePolicy {
    /// The payload becomes the whole record.
    Replace,
    /// The payload is deep-merged into the existing record.
    Merge,
    /// The record is removed.
    Evict,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEvent {
    pub kind:      UpdateEventKind,
    pub namespace: Namespace,
    pub key:       EntityKey,
    pub payload:   Option<Value>,
}

impl From<api::UpdateEventKind> for UpdateEventKind {
    fn from(kind: api::UpdateEventKind) -> Self {
        match kind {
            api::UpdateEventKind::Pair => UpdateEventKind::Pair,
            api::UpdateEventKind::PairEsdtTokens => UpdateEventKind::PairEsdtTokens,
            api::UpdateEventKind::Token => UpdateEventKind::Token,
        }
    }
}

impl From<api::UpdateEvent> for UpdateEvent {
    fn from(event: api::UpdateEvent) -> Self {
        Self {
            kind:      event.kind.into(),
            namespace: event.namespace,
            key:       event.key,
            payload:   event.payload,
        }
    }
}
