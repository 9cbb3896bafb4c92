use {
    crate::{
        api::RestError,
        state::Store,
    },
    axum::{
        extract::{
            Path,
            State,
        },
        routing::get,
        Json,
        Router,
    },
    resolver_cache_api_types::{
        EntityKey,
        EntityRecord,
        ErrorBodyResponse,
        Namespace,
        Route,
    },
    std::sync::Arc,
};

/// Fetch the cached record of an entity without triggering an upstream fetch.
#[utoipa::path(get, path = "/v1/namespaces/{namespace}/entities/{key}",
params(
    ("namespace" = String, description = "Namespace of the entity"),
    ("key" = String, description = "Key of the entity"),
), responses(
    (status = 200, description = "The cached record", body = EntityRecord),
    (status = 404, description = "Namespace or entity was not found", body = ErrorBodyResponse),
),)]
pub async fn get_entity_record(
    State(store): State<Arc<Store>>,
    Path((namespace, key)): Path<(Namespace, EntityKey)>,
) -> Result<Json<EntityRecord>, RestError> {
    let record = store
        .entity_store
        .get_entity_record(&namespace, &key)?
        .ok_or(RestError::EntityNotFound)?;
    Ok(Json(record.as_ref().clone().into_api(namespace)))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new().route(Route::EntityRecord.as_ref(), get(get_entity_record))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            api::tests::new_test_state,
            kernel::upstream::MockFetcher,
        },
        serde_json::json,
    };

    #[tokio::test]
    async fn test_get_entity_record() {
        let store = new_test_state(MockFetcher::new());
        let stored = store
            .entity_store
            .put_entity_record("pairs", "erd1".to_string(), json!({"state": "Active"}))
            .await
            .unwrap();

        let Json(record) = get_entity_record(
            State(store.clone()),
            Path(("pairs".to_string(), "erd1".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(record.namespace, "pairs");
        assert_eq!(record.value, json!({"state": "Active"}));
        assert_eq!(record.version, stored.version);

        let err = get_entity_record(
            State(store.clone()),
            Path(("pairs".to_string(), "erd2".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err, RestError::EntityNotFound);

        let err = get_entity_record(
            State(store),
            Path(("farms".to_string(), "erd1".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err, RestError::NamespaceNotFound("farms".to_string()));
    }
}
