//! Error types for trackpd-report
//!
//! A failure at any pipeline stage aborts the whole regeneration run and
//! surfaces here. Handlers turn it into a JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Report pipeline and delivery error
#[derive(Debug, Error)]
pub enum ReportError {
    /// trackpd-common error (store, credentials, config)
    #[error("Common error: {0}")]
    Common(#[from] trackpd_common::Error),

    /// IO error (chart files, artifact persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Chart rasterisation failed
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// PDF assembly or serialisation failed
    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    /// Raster encode/decode failed
    #[error("Image error: {0}")]
    Image(String),

    /// Layout configuration rejected
    #[error("Invalid layout: {0}")]
    Layout(String),

    /// Blocking render task panicked or was cancelled
    #[error("Render task failed: {0}")]
    Task(String),
}

impl ReportError {
    fn code(&self) -> &'static str {
        match self {
            ReportError::Common(_) => "COMMON_ERROR",
            ReportError::Io(_) => "IO_ERROR",
            ReportError::Chart(_) => "CHART_ERROR",
            ReportError::Pdf(_) => "PDF_ERROR",
            ReportError::Image(_) => "IMAGE_ERROR",
            ReportError::Layout(_) => "LAYOUT_ERROR",
            ReportError::Task(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        tracing::error!("Report request failed: {}", self);

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ReportError::Chart("x".into()).code(), "CHART_ERROR");
        assert_eq!(ReportError::Task("join".into()).code(), "INTERNAL_ERROR");
        let common: ReportError = trackpd_common::Error::NotFound("users/x".into()).into();
        assert_eq!(common.code(), "COMMON_ERROR");
    }

    #[test]
    fn test_into_response_is_500() {
        let response = ReportError::Pdf("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
