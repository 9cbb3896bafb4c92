use {
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
        event::{
            PublishResult,
            UpdateEvent,
        },
        ErrorBodyResponse,
        Route,
    },
    std::sync::Arc,
};

/// Publish an update event for a cached entity.
///
/// The event is applied asynchronously according to the namespace's policy for its kind.
/// An event without payload evicts the entity.
#[utoipa::path(post, path = "/v1/events", request_body = UpdateEvent, responses(
    (status = 200, description = "The event was published", body = PublishResult),
    (status = 400, response = ErrorBodyResponse),
    (status = 404, description = "Namespace was not found", body = ErrorBodyResponse),
    (status = 503, description = "No consumer is running", body = ErrorBodyResponse),
),)]
pub async fn post_event(
    State(store): State<Arc<Store>>,
    Json(event): Json<UpdateEvent>,
) -> Result<Json<PublishResult>, RestError> {
    store.entity_store.namespace(&event.namespace)?;
    let receivers = store.event_bus.publish(event.into()).map_err(|err| {
        tracing::error!(error = ?err, "Failed to publish update event");
        RestError::TemporarilyUnavailable
    })?;
    Ok(Json(PublishResult { receivers }))
}

pub fn get_routes() -> Router<Arc<Store>> {
    Router::new().route(Route::Events.as_ref(), post(post_event))
}
