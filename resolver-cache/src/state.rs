use {
    crate::{
        event::EventBus,
        kernel::upstream::Fetcher,
        query::service::Service as QueryService,
        store::EntityStore,
    },
    axum_prometheus::metrics_exporter_prometheus::PrometheusHandle,
    std::sync::Arc,
};

/// Components shared by the api handlers and the workers. Built once in `start_server`.
pub struct Store {
    pub entity_store:     Arc<EntityStore>,
    pub event_bus:        EventBus,
    pub query_service:    QueryService,
    pub fetcher:          Arc<dyn Fetcher>,
    pub metrics_recorder: PrometheusHandle,
}
