//! Metrics Server
//!
//! Serves the cache counters and gauges over /metrics in OpenMetrics format.
use {
    crate::{
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
        state::Store,
    },
    anyhow::Result,
    axum::{
        routing::get,
        Router,
    },
    axum_prometheus::PrometheusMetricLayerBuilder,
    resolver_cache_api_types::Route,
    std::sync::{
        atomic::Ordering,
        Arc,
    },
};

pub fn build_metrics_router(store: Arc<Store>) -> Router {
    let (_, metric_handle) = PrometheusMetricLayerBuilder::new()
        .with_metrics_from_fn(|| store.metrics_recorder.clone())
        .build_pair();
    Router::new().route(
        Route::Metrics.as_ref(),
        get(move || {
            store.entity_store.update_metrics();
            let rendered = metric_handle.render();
            async move { rendered }
        }),
    )
}

pub async fn start_metrics(run_options: RunOptions, store: Arc<Store>) -> Result<()> {
    tracing::info!(addr = %run_options.server.metrics_addr, "Starting Metrics Server...");
    let app = build_metrics_router(store);

    let listener = tokio::net::TcpListener::bind(&run_options.server.metrics_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down metrics server...");
        })
        .await?;
    Ok(())
}
