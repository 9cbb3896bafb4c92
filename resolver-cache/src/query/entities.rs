use {
    crate::kernel::entities::{
        Arguments,
        EntityKey,
    },
    resolver_cache_api_types::query as api,
};

#[derive(Clone, Debug, PartialEq)]
pub struct QueryField {
    pub name:       String,
    pub sub_fields: Vec<QueryField>,
}

impl QueryField {
    pub fn new(name: &str) -> Self {
        Self {
            name:       name.to_string(),
            sub_fields: vec![],
        }
    }

    pub fn nested(name: &str, sub_fields: Vec<QueryField>) -> Self {
        Self {
            name: name.to_string(),
            sub_fields,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvableQuery {
    pub query_name:       String,
    pub query_alias:      Option<String>,
    pub requested_fields: Vec<QueryField>,
    pub arguments:        Arguments,
}

impl ResolvableQuery {
    /// Key of the projection in the result.
    pub fn result_key(&self) -> &str {
        self.query_alias.as_deref().unwrap_or(&self.query_name)
    }
}

/// Entities addressed by a query's key argument.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryTarget {
    Single(EntityKey),
    Many(Vec<EntityKey>),
}

impl From<api::QueryField> for QueryField {
    fn from(field: api::QueryField) -> Self {
        Self {
            name:       field.name,
            sub_fields: field.sub_fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<api::ResolvableQuery> for ResolvableQuery {
    fn from(query: api::ResolvableQuery) -> Self {
        Self {
            query_name:       query.query_name,
            query_alias:      query.query_alias,
            requested_fields: query.requested_fields.into_iter().map(Into::into).collect(),
            arguments:        query.arguments,
        }
    }
}
