use {
    serde::{
        Deserialize,
        Serialize,
    },
    utoipa::{
        ToResponse,
        ToSchema,
    },
};

/// A single field of a selection set, possibly with nested sub-fields.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    /// Name of the field in the cached entity.
    #[schema(example = "firstToken")]
    pub name:       String,
    /// Fields to project from a nested value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub sub_fields: Vec<QueryField>,
}

/// A field projection request against a cached namespace.
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvableQuery {
    /// Name of the query, which selects the namespace.
    #[schema(example = "pairs")]
    pub query_name:       String,
    /// Key under which the projection is returned instead of the query name.
    #[schema(example = "pair")]
    pub query_alias:      Option<String>,
    /// The selection set to project.
    pub requested_fields: Vec<QueryField>,
    /// Query arguments. The namespace key argument selects the entity or entities.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub arguments:        serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, ToSchema, ToResponse, Clone, Debug, PartialEq)]
pub struct QueryResult {
    /// The projection keyed by the query alias or name.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}
