use {
    crate::{
        config::RunOptions,
        event,
        kernel::error::CacheError,
        query,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
        store,
    },
    anyhow::Result,
    axum::{
        http::StatusCode,
        response::{
            IntoResponse,
            Response,
        },
        routing::get,
        Json,
        Router,
    },
    clap::crate_version,
    resolver_cache_api_types::{
        event::{
            PublishResult,
            UpdateEvent,
            UpdateEventKind,
        },
        query::{
            QueryField,
            QueryResult,
            ResolvableQuery,
        },
        EntityRecord,
        ErrorBodyResponse,
        Route,
    },
    std::sync::{
        atomic::Ordering,
        Arc,
    },
    tower_http::cors::CorsLayer,
    utoipa::OpenApi,
    utoipa_redoc::{
        Redoc,
        Servable,
    },
};

async fn root() -> String {
    format!("Resolver Cache Server API {}", crate_version!())
}

#[derive(Debug, PartialEq)]
pub enum RestError {
    /// The request contained invalid parameters
    BadParameters(String),
    /// The namespace is not registered
    NamespaceNotFound(String),
    /// The entity is not cached
    EntityNotFound,
    /// The backing fetch of an entity failed
    UpstreamFailure(String),
    /// Internal error occurred during processing the request
    TemporarilyUnavailable,
}

impl RestError {
    pub fn to_status_and_message(&self) -> (StatusCode, String) {
        match self {
            RestError::BadParameters(msg) => {
                (StatusCode::BAD_REQUEST, format!("Bad parameters: {}", msg))
            }
            RestError::NamespaceNotFound(namespace) => (
                StatusCode::NOT_FOUND,
                format!("Namespace {} is not registered", namespace),
            ),
            RestError::EntityNotFound => (
                StatusCode::NOT_FOUND,
                "Entity with the specified key is not cached".to_string(),
            ),
            RestError::UpstreamFailure(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream fetch failed: {}", msg),
            ),
            RestError::TemporarilyUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "This service is temporarily unavailable".to_string(),
            ),
        }
    }
}

impl From<CacheError> for RestError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::UnknownNamespace(namespace) => RestError::NamespaceNotFound(namespace),
            CacheError::FetchFailed { .. } => RestError::UpstreamFailure(err.to_string()),
            CacheError::MissingArgument { .. }
            | CacheError::InvalidArgument { .. }
            | CacheError::InvalidPayload { .. } => RestError::BadParameters(err.to_string()),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, msg) = self.to_status_and_message();
        (status, Json(ErrorBodyResponse { error: msg })).into_response()
    }
}

pub async fn live() -> Response {
    (StatusCode::OK, "OK").into_response()
}

#[derive(OpenApi)]
#[openapi(
paths(
query::api::post_query,
event::api::post_event,
store::api::get_entity_record,
),
components(
schemas(
EntityRecord,
ErrorBodyResponse,
PublishResult,
QueryField,
QueryResult,
ResolvableQuery,
UpdateEvent,
UpdateEventKind,
),
responses(
ErrorBodyResponse,
EntityRecord,
PublishResult,
QueryResult,
),
),
tags(
(name = "Resolver Cache", description = "Read-through cache in front of the blockchain data resolvers.\
 Serves field projections of cached entities and applies entity update events.")
)
)]
struct ApiDoc;

pub fn build_router(store: Arc<Store>) -> Router {
    let v1_routes = Router::new().nest(
        Route::V1.as_ref(),
        Router::new()
            .merge(query::api::get_routes())
            .merge(event::api::get_routes())
            .merge(store::api::get_routes()),
    );

    Router::new()
        .merge(Redoc::with_url(Route::Docs.as_ref(), ApiDoc::openapi()))
        .merge(v1_routes)
        .route(Route::Root.as_ref(), get(root))
        .route(Route::Liveness.as_ref(), get(live))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn start_api(run_options: RunOptions, store: Arc<Store>) -> Result<()> {
    tracing::info!(addr = %run_options.server.listen_addr, "Starting RPC server...");
    let app = build_router(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down RPC server...");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::{
            event::EventBus,
            kernel::upstream::MockFetcher,
            query::service::Service as QueryService,
            store::tests::new_test_store,
        },
        anyhow::anyhow,
        axum_prometheus::metrics_exporter_prometheus::PrometheusBuilder,
    };

    pub fn new_test_state(fetcher: MockFetcher) -> Arc<Store> {
        let entity_store = Arc::new(new_test_store());
        Arc::new(Store {
            entity_store:     entity_store.clone(),
            event_bus:        EventBus::new(16),
            query_service:    QueryService::new(entity_store),
            fetcher:          Arc::new(fetcher),
            metrics_recorder: PrometheusBuilder::new().build_recorder().handle(),
        })
    }

    #[test]
    fn test_cache_errors_map_to_statuses() {
        let status = |err: CacheError| RestError::from(err).to_status_and_message().0;

        assert_eq!(
            status(CacheError::UnknownNamespace("farms".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(CacheError::MissingArgument {
                query_name: "pairs".to_string(),
                argument:   "address".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CacheError::InvalidArgument {
                query_name: "pairs".to_string(),
                argument:   "address".to_string(),
                reason:     "keys must be strings or numbers".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CacheError::fetch_failed("pairs", "erd1", anyhow!("timeout"))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RestError::TemporarilyUnavailable.to_status_and_message().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_response_status() {
        let response = RestError::EntityNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_router_builds() {
        let _ = build_router(new_test_state(MockFetcher::new()));
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/query"));
        assert!(doc.paths.paths.contains_key("/v1/events"));
    }
}
