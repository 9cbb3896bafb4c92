pub mod api;
pub mod config;
pub mod event;
pub mod kernel;
pub mod metrics_api;
pub mod query;
pub mod server;
pub mod state;
pub mod store;
