use {
    crate::{
        api,
        config::{
            Config,
            RunOptions,
        },
        event::EventBus,
        kernel::{
            upstream::UpstreamFetcher,
            workers::{
                run_expiry_loop,
                run_update_event_loop,
            },
        },
        metrics_api::start_metrics,
        query::service::Service as QueryService,
        state::Store,
        store::EntityStore,
    },
    anyhow::anyhow,
    axum_prometheus::metrics_exporter_prometheus::PrometheusBuilder,
    futures::future::join_all,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
};

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?err, "Failed to listen for the shutdown signal");
        }
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;
    tracing::info!(
        namespaces = ?config.namespaces.iter().map(|namespace| namespace.name.as_str()).collect::<Vec<_>>(),
        "Loaded cache configuration"
    );

    let entity_store = Arc::new(
        EntityStore::new(config.namespaces.clone(), config.lock_poll_interval)
            .with_tombstone_retention(config.tombstone_retention),
    );
    let event_bus = EventBus::new(config.event_channel_size);
    // Subscribed before the api starts so no published event is missed.
    let event_receiver = event_bus.subscribe();
    let store = Arc::new(Store {
        entity_store:     entity_store.clone(),
        event_bus,
        query_service:    QueryService::new(entity_store.clone()),
        fetcher:          Arc::new(UpstreamFetcher::new(
            &config.namespaces,
            config.upstream_timeout,
        )?),
        metrics_recorder: PrometheusBuilder::new().install_recorder()?,
    });

    let update_event_loop = tokio::spawn(run_update_event_loop(
        entity_store.clone(),
        event_receiver,
    ));
    let expiry_loop = tokio::spawn(run_expiry_loop(
        entity_store,
        config.expiry_check_interval,
    ));
    let server_loop = tokio::spawn(api::start_api(run_options.clone(), store.clone()));
    let metrics_loop = tokio::spawn(start_metrics(run_options, store));

    for result in join_all(vec![
        update_event_loop,
        expiry_loop,
        server_loop,
        metrics_loop,
    ])
    .await
    {
        match result {
            Ok(Err(err)) => tracing::error!(error = ?err, "Task exited with an error"),
            Err(err) => tracing::error!(error = ?err, "Task panicked"),
            Ok(Ok(())) => {}
        }
    }
    Ok(())
}

// A static exit flag to indicate to running tasks that we're shutting down. This is used to
// gracefully shutdown the application.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
