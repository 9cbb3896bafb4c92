use {
    super::entities::{
        EntityKey,
        Namespace,
    },
    std::{
        fmt,
        sync::Arc,
    },
};

/// Failures surfaced by the cache core.
///
/// The type is `Clone` so one failure can be handed to every caller that joined the
/// same coalesced operation.
#[derive(Clone, Debug)]
pub enum CacheError {
    /// The backing fetch failed. Nothing is cached for it.
    FetchFailed {
        namespace: Namespace,
        key:       EntityKey,
        reason:    Arc<anyhow::Error>,
    },
    /// The query name or event namespace is not registered.
    UnknownNamespace(String),
    /// The query lacks the namespace key argument.
    MissingArgument { query_name: String, argument: String },
    /// The key argument is present but not a string or a list of strings.
    InvalidArgument {
        query_name: String,
        argument:   String,
        reason:     String,
    },
    /// An update event payload could not be applied.
    InvalidPayload {
        namespace: Namespace,
        key:       EntityKey,
        reason:    String,
    },
}

impl CacheError {
    pub fn fetch_failed(namespace: &str, key: &str, reason: anyhow::Error) -> Self {
        CacheError::FetchFailed {
            namespace: namespace.to_string(),
            key:       key.to_string(),
            reason:    Arc::new(reason),
        }
    }

    /// Whether the error is the caller's fault rather than a backing source failure.
    pub fn is_malformed_query(&self) -> bool {
        matches!(
            self,
            CacheError::UnknownNamespace(_)
                | CacheError::MissingArgument { .. }
                | CacheError::InvalidArgument { .. }
        )
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::FetchFailed {
                namespace,
                key,
                reason,
            } => write!(f, "Failed to fetch {}/{}: {:#}", namespace, key, reason),
            CacheError::UnknownNamespace(name) => write!(f, "Unknown namespace: {}", name),
            CacheError::MissingArgument {
                query_name,
                argument,
            } => write!(
                f,
                "Query {} is missing required argument {}",
                query_name, argument
            ),
            CacheError::InvalidArgument {
                query_name,
                argument,
                reason,
            } => write!(
                f,
                "Query {} has invalid argument {}: {}",
                query_name, argument, reason
            ),
            CacheError::InvalidPayload {
                namespace,
                key,
                reason,
            } => write!(
                f,
                "Invalid update payload for {}/{}: {}",
                namespace, key, reason
            ),
        }
    }
}

impl std::error::Error for CacheError {}
