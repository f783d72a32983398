//! trackpd-ingest library - tremor sample ingestion
//!
//! Accepts one tremor sample per request, stamps the capture time and
//! appends it to the document store.

use axum::Router;
use tower_http::trace::TraceLayer;
use trackpd_common::StoreClient;

pub mod api;
pub mod config;
pub mod error;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide store client
    pub store: StoreClient,
    /// Collection samples are appended to
    pub collection: String,
}

impl AppState {
    pub fn new(store: StoreClient, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::tremor_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
