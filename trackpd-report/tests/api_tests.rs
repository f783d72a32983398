//! Integration tests for trackpd-report HTTP endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - GET /RepPDF builds the report when absent and serves it as an attachment
//! - A second GET serves the cached artifact without touching the store
//! - DELETE /RepPDF invalidates the artifact
//! - Store failures surface as JSON errors

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use trackpd_common::models::DocumentKey;
use trackpd_common::{Document, StoreClient};
use trackpd_report::pipeline::chart::ChartOptions;
use trackpd_report::pipeline::fetch::{CollectionNames, RecordLocators, RecordSource, ReportSubject};
use trackpd_report::{build_router, AppState, CachePolicy, DeliveryGate, PipelineSettings, ReportPipeline};

/// Test helper: store wrapper that counts every read
struct CountingSource {
    inner: StoreClient,
    calls: AtomicUsize,
}

impl CountingSource {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for CountingSource {
    async fn fetch_profile(&self, key: &DocumentKey) -> trackpd_common::Result<Option<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_document(key).await
    }

    async fn fetch_collection(&self, collection: &str) -> trackpd_common::Result<Vec<Document>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_collection(collection).await
    }
}

fn locators() -> RecordLocators {
    let subject = ReportSubject {
        profile_id: "profile-1".to_string(),
        activity_owner: "owner-1".to_string(),
    };
    RecordLocators::for_subject(&subject, &CollectionNames::default())
}

/// Test helper: app over a seeded in-memory store
async fn setup_app(dir: &TempDir) -> (axum::Router, Arc<CountingSource>, Arc<DeliveryGate>) {
    let store = StoreClient::open_in_memory().await.unwrap();
    let profile = json!({"name": "Ada", "age": 71}).as_object().cloned().unwrap();
    store.set_document(&locators().profile, &profile).await.unwrap();
    let sample = json!({"time": "10:00", "intensity": 2}).as_object().cloned().unwrap();
    store.add_document("tremors", &sample).await.unwrap();

    let source = Arc::new(CountingSource {
        inner: store,
        calls: AtomicUsize::new(0),
    });
    let pipeline = ReportPipeline::new(PipelineSettings {
        output_dir: dir.path().to_path_buf(),
        chart: ChartOptions {
            width: 400,
            height: 160,
            tick_stride: 3,
        },
        ..Default::default()
    });
    let gate = Arc::new(DeliveryGate::new(
        pipeline,
        source.clone(),
        locators(),
        CachePolicy::PresenceOnly,
    ));

    (build_router(AppState::new(gate.clone())), source, gate)
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (app, _, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "trackpd-report");
    assert!(json["version"].is_string());
}

// =============================================================================
// GET /RepPDF
// =============================================================================

#[tokio::test]
async fn test_get_report_generates_when_absent() {
    let dir = TempDir::new().unwrap();
    let (app, source, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"users.pdf\""
    );

    let body = body_bytes(response.into_body()).await;
    assert!(body.starts_with(b"%PDF"));
    assert_eq!(source.calls(), 3);
    assert!(dir.path().join("users.pdf").exists());
}

#[tokio::test]
async fn test_second_request_does_not_fetch() {
    let dir = TempDir::new().unwrap();
    let (app, source, _) = setup_app(&dir).await;

    let first = app.clone().oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    let first_body = body_bytes(first.into_body()).await;
    let calls_after_first = source.calls();

    let second = app.oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_bytes(second.into_body()).await;

    assert_eq!(source.calls() - calls_after_first, 0);
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn test_existing_artifact_served_as_is() {
    let dir = TempDir::new().unwrap();
    let (app, source, _) = setup_app(&dir).await;
    std::fs::write(dir.path().join("users.pdf"), b"%PDF-stale").unwrap();

    let response = app.oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, b"%PDF-stale");
    assert_eq!(source.calls(), 0);
}

// =============================================================================
// DELETE /RepPDF
// =============================================================================

#[tokio::test]
async fn test_delete_invalidates_artifact() {
    let dir = TempDir::new().unwrap();
    let (app, source, gate) = setup_app(&dir).await;

    gate.regenerate().await.unwrap();
    let calls_after_startup = source.calls();
    assert!(gate.artifact_path().exists());

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/RepPDF"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!gate.artifact_path().exists());

    let response = app.oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(source.calls() - calls_after_startup, 3);
}

#[tokio::test]
async fn test_delete_without_artifact_is_no_content() {
    let dir = TempDir::new().unwrap();
    let (app, _, _) = setup_app(&dir).await;

    let response = app.oneshot(test_request("DELETE", "/RepPDF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_store_failure_is_json_error() {
    let dir = TempDir::new().unwrap();
    let (app, source, _) = setup_app(&dir).await;
    source.inner.close().await;

    let response = app.oneshot(test_request("GET", "/RepPDF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = serde_json::from_slice(&body_bytes(response.into_body()).await).unwrap();
    assert_eq!(json["error"]["code"], "COMMON_ERROR");
    assert!(!dir.path().join("users.pdf").exists());
}
