//! Tremor sample ingestion
//!
//! Any JSON object is accepted as-is; the only server-side change is the
//! `time` field, which is always overwritten with the local capture time.

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use trackpd_common::models::{tremor_fields, TremorLevel};
use trackpd_common::time::{capture_time, now};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Fixed acknowledgment
pub const ACK_MESSAGE: &str = "Tremor data received";

#[derive(Debug, Serialize)]
pub struct TremorAck {
    pub message: &'static str,
}

/// POST /tremor
pub async fn receive_tremor(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<TremorAck>> {
    let Value::Object(mut sample) = body else {
        return Err(ApiError::BadRequest(
            "tremor sample must be a JSON object".to_string(),
        ));
    };

    let time = capture_time(&now());
    sample.insert(tremor_fields::TIME.to_string(), Value::String(time.clone()));

    let intensity = sample.get(tremor_fields::INTENSITY);
    let level = intensity
        .and_then(Value::as_i64)
        .and_then(TremorLevel::from_intensity)
        .map(|l| l.situation_label());
    let intensity = intensity.map(display_field).unwrap_or_else(|| "-".to_string());
    let situation = sample
        .get(tremor_fields::SITUATION)
        .map(display_field)
        .unwrap_or_else(|| "-".to_string());
    info!(
        "Tremor sample: intensity={} situation={} time={} level={}",
        intensity,
        situation,
        time,
        level.unwrap_or("unclassified")
    );

    state.store.add_document(&state.collection, &sample).await?;

    Ok(Json(TremorAck {
        message: ACK_MESSAGE,
    }))
}

/// Log form of a field: strings bare, anything else as compact JSON
fn display_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build tremor routes
pub fn tremor_routes() -> Router<AppState> {
    Router::new().route("/tremor", post(receive_tremor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_field_strings_are_bare() {
        assert_eq!(display_field(&json!("walking")), "walking");
        assert_eq!(display_field(&json!(5)), "5");
        assert_eq!(display_field(&json!(2.5)), "2.5");
        assert_eq!(display_field(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
