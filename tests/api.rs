mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::Harness;
use report_qa::api::{create_router, AppState};
use report_qa::domain::DomainError;

const BOUNDARY: &str = "report-qa-test-boundary";

fn router(h: &Harness) -> (Router, AppState) {
    let state = AppState::new(h.pipeline.clone());
    (create_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/v1/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_index_page_is_served() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/api/v1/ask"));
}

#[tokio::test]
async fn test_ready_requires_loaded_index() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["index"], "missing");

    h.pipeline
        .ingest
        .build_index(&h.pdf_path(), false)
        .await
        .unwrap();

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_ready_requires_credential() {
    let h = Harness::with_credential(false);
    h.pipeline
        .ingest
        .build_index(&h.pdf_path(), false)
        .await
        .unwrap();
    let (app, _) = router(&h);

    let (status, body) = send(&app, get("/ready")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["index"], "loaded");
    assert_eq!(body["credentials"], "missing");
}

#[tokio::test]
async fn test_ask_before_ingest_is_not_found() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, post_json("/api/v1/ask", json!({ "question": "Revenue?" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_ask_empty_question_is_bad_request() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, post_json("/api/v1/ask", json!({ "question": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_ask_without_credential_is_unavailable() {
    let h = Harness::with_credential(false);
    h.pipeline
        .ingest
        .build_index(&h.pdf_path(), false)
        .await
        .unwrap();
    let (app, _) = router(&h);

    let (status, body) = send(&app, post_json("/api/v1/ask", json!({ "question": "Risks?" }))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "configuration");
}

#[tokio::test]
async fn test_load_then_ask() {
    let h = Harness::new();
    h.pipeline
        .ingest
        .build_index(&h.pdf_path(), false)
        .await
        .unwrap();

    // A fresh session over a copy of the index starts unloaded.
    let fresh = Harness::new();
    let copied = copy_dir(&h.index_dir(), &fresh.index_dir());
    assert!(copied.contains(&"manifest.json".to_string()));

    let (app, _) = router(&fresh);

    let (status, body) = send(&app, get("/api/v1/index")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], false);
    assert!(body["manifest"]["chunk_count"].as_u64().unwrap() > 0);

    let (status, body) = send(&app, Request::post("/api/v1/index/load").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "loaded");

    let (status, body) = send(
        &app,
        post_json("/api/v1/ask", json!({ "question": "What are the key risks of competition?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Revenue grew strongly.");
    let sources = body["sources"].as_array().unwrap();
    assert_eq!(body["num_sources"].as_u64().unwrap() as usize, sources.len());
    assert!(!sources.is_empty() && sources.len() <= 4);
    assert_eq!(sources[0]["page"], 3);
}

#[tokio::test]
async fn test_load_without_index_is_not_found() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, Request::post("/api/v1/index/load").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_upload_rebuilds_index() {
    let h = Harness::new();
    let upload_dir = h.pipeline.config.config.server.upload_dir.clone();
    let (app, _) = router(&h);

    let (status, body) = send(&app, upload("annual report.pdf", b"%PDF-1.7 uploaded")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "built");
    assert_eq!(body["manifest"]["page_count"], 5);
    assert!(body["manifest"]["source_path"]
        .as_str()
        .unwrap()
        .ends_with("annual_report.pdf"));
    assert_eq!(std::fs::read_dir(&upload_dir).unwrap().count(), 1);

    let (status, _) = send(&app, post_json("/api/v1/ask", json!({ "question": "Revenue?" }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_new_upload_replaces_previous_upload() {
    let h = Harness::new();
    let upload_dir = h.pipeline.config.config.server.upload_dir.clone();
    let (app, _) = router(&h);

    let (status, first) = send(&app, upload("first.pdf", b"%PDF-1.7 first")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(&app, upload("second.pdf", b"%PDF-1.7 second")).await;
    assert_eq!(status, StatusCode::OK);

    let remaining: Vec<_> = std::fs::read_dir(&upload_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].to_string_lossy(),
        second["manifest"]["source_path"].as_str().unwrap()
    );
    assert!(!std::path::Path::new(first["manifest"]["source_path"].as_str().unwrap()).exists());
    assert!(h.pdf_path().exists());
}

#[tokio::test]
async fn test_failed_upload_build_keeps_previous_upload() {
    let h = Harness::new();
    let upload_dir = h.pipeline.config.config.server.upload_dir.clone();
    let (app, _) = router(&h);

    let (status, first) = send(&app, upload("first.pdf", b"%PDF-1.7 first")).await;
    assert_eq!(status, StatusCode::OK);

    h.loader.fail_with("broken xref table");
    let (status, body) = send(&app, upload("broken.pdf", b"%PDF-1.7 broken")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "external_service");

    let remaining: Vec<_> = std::fs::read_dir(&upload_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].to_string_lossy(),
        first["manifest"]["source_path"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_upload_rejects_non_pdf() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, upload("notes.txt", b"just some text")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_second_ingest_is_refused_while_one_runs() {
    let h = Harness::new();
    let (app, state) = router(&h);

    let _running = state.begin_ingest().unwrap();
    assert!(matches!(state.begin_ingest(), Err(DomainError::Conflict(_))));

    let (status, body) = send(&app, upload("report.pdf", b"%PDF-1.4")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn test_examples_come_from_prompts_config() {
    let h = Harness::new();
    let (app, _) = router(&h);

    let (status, body) = send(&app, get("/api/v1/examples")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["What are the key risks?"]));
}

fn copy_dir(from: &std::path::Path, to: &std::path::Path) -> Vec<String> {
    std::fs::create_dir_all(to).unwrap();
    std::fs::read_dir(from)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            std::fs::copy(entry.path(), to.join(entry.file_name())).unwrap();
            entry.file_name().into_string().unwrap()
        })
        .collect()
}
