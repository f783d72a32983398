//! trackpd-report library - report assembly and delivery
//!
//! Builds the health-monitoring PDF from the document store and serves it
//! over HTTP.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod pipeline;

pub use delivery::{CachePolicy, DeliveryGate};
pub use error::{ReportError, Result};
pub use pipeline::{GeneratedReport, PipelineSettings, ReportPipeline};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Memoising front of the report pipeline
    pub gate: Arc<DeliveryGate>,
}

impl AppState {
    pub fn new(gate: Arc<DeliveryGate>) -> Self {
        Self { gate }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::report_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
