pub mod coalescer;
pub mod entities;
pub mod error;
pub mod lock;
pub mod upstream;
pub mod workers;
