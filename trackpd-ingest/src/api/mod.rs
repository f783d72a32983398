//! HTTP API handlers for trackpd-ingest

pub mod health;
pub mod tremor;

pub use health::health_routes;
pub use tremor::tremor_routes;
