//! Report delivery endpoints
//!
//! `GET /RepPDF` streams the artifact as a download, rebuilding it only when
//! the delivery gate finds it absent or stale. `DELETE /RepPDF` drops the
//! artifact so the next read rebuilds it.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::error::ReportError;
use crate::AppState;

/// GET /RepPDF
pub async fn get_report(State(state): State<AppState>) -> Result<Response, ReportError> {
    let delivered = state.gate.fetch_artifact().await?;
    debug!(
        "Delivering {} bytes (regenerated: {})",
        delivered.bytes.len(),
        delivered.regenerated
    );

    let disposition = format!("attachment; filename=\"{}\"", state.gate.artifact_name());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        delivered.bytes,
    )
        .into_response())
}

/// DELETE /RepPDF
pub async fn invalidate_report(State(state): State<AppState>) -> Result<StatusCode, ReportError> {
    state.gate.invalidate().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new().route("/RepPDF", get(get_report).delete(invalidate_report))
}
