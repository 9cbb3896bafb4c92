use {
    super::service::resolve::ResolveInput,
    crate::{
        api::RestError,
        state::Store,
    },
    axum::{
        extract::State,
        routing::post,
        Json,
        Router,
    },
    resolver_cache_api_types::{
        query::{
            QueryResult,
            ResolvableQuery,
        },
        ErrorBodyResponse,
        Route,
    },
    std::sync::Arc,
};

/// Resolve a field projection against the cache.
///
/// Entities that are missing or older than the namespace ttl are fetched from the upstream
/// once, however many identical queries are waiting on them.
#[utoipa::path(post, path = "/v1/query", request_body = ResolvableQuery, responses(
    (status = 200, description = "The projection keyed by the query alias or name", body = QueryResult,
    example = json!({"data": {"pair": {"firstToken": {"identifier": "WEGLD-bd4d79"}}}})),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Namespace was not found", body = ErrorBodyResponse),
    (status = 502, description = "Upstream fetch failed", body = ErrorBodyResponse),
),)]
pub async fn post_query(
    State(store): State<Arc<Store>>,
    Json(query): Json<ResolvableQuery>,
) -> Result<Json<QueryResult>, RestError> {
    let data = store
        .query_service
        .resolve(ResolveInput {
            query:   query.into(),
            fetcher: store.fetcher.clone(),
        })
        .await?;
    Ok(Json(QueryResult { data }))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new().route(Route::Query.as_ref(), post(post_query))
}
