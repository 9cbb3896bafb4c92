use {
    serde::{
        Deserialize,
        Serialize,
    },
    strum::AsRefStr,
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

pub mod event;
pub mod query;

pub type Namespace = String;
pub type EntityKey = String;

#[derive(ToResponse, ToSchema, Serialize, Deserialize, Debug)]
#[response(description = "An error occurred processing the request")]
pub struct ErrorBodyResponse {
    pub error: String,
}

/// A cached entity together with its freshness marker.
#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct EntityRecord {
    /// The namespace the record belongs to.
    #[schema(example = "pairs")]
    pub namespace:  Namespace,
    /// The key of the record within its namespace.
    #[schema(example = "erd1qqqqqqqqqqqqqpgqeel2kumf0r8ffyhth7pqdujjat9nx0862jpsg2pqaq")]
    pub key:        EntityKey,
    /// The cached value.
    #[schema(value_type = Object)]
    pub value:      serde_json::Value,
    /// The time the record was last written.
    #[schema(example = "2024-05-23T21:26:57.329954Z", value_type = String)]
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
    /// Monotonic write counter within the namespace.
    #[schema(example = 42)]
    pub version:    u64,
}

#[derive(AsRefStr, Clone)]
#[strum(prefix = "/")]
pub enum Route {
    #[strum(serialize = "v1")]
    V1,
    #[strum(serialize = "query")]
    Query,
    #[strum(serialize = "events")]
    Events,
    #[strum(serialize = "namespaces/:namespace/entities/:key")]
    EntityRecord,
    #[strum(serialize = "")]
    Root,
    #[strum(serialize = "live")]
    Liveness,
    #[strum(serialize = "docs")]
    Docs,
    #[strum(serialize = "metrics")]
    Metrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::V1.as_ref(), "/v1");
        assert_eq!(Route::Query.as_ref(), "/query");
        assert_eq!(
            Route::EntityRecord.as_ref(),
            "/namespaces/:namespace/entities/:key"
        );
        assert_eq!(Route::Liveness.as_ref(), "/live");
        assert_eq!(Route::Root.as_ref(), "/");
    }
}
