//! Gemini provider tests against a stub of the upstream API.
//!
//! The stub serves the Files API resumable-upload handshake and the
//! `generateContent` endpoint on a random local port, and records the
//! generation request bodies so tests can assert on the assembled parts.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use verdict_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use verdict_service::services::providers::{CaseFile, TextProvider};

#[derive(Clone)]
struct StubState {
    base: String,
    generate_bodies: Arc<Mutex<Vec<Value>>>,
}

/// Resumable-upload `start` call. Files whose display name contains
/// "reject" fail with a 500 to exercise the skip path.
async fn upload_start(State(state): State<StubState>, Json(body): Json<Value>) -> impl IntoResponse {
    let display_name = body["file"]["display_name"].as_str().unwrap_or_default();
    if display_name.contains("reject") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))).into_response();
    }

    (
        StatusCode::OK,
        [(
            "x-goog-upload-url",
            format!("{}/upload-session/{}", state.base, display_name),
        )],
        Json(json!({})),
    )
        .into_response()
}

async fn upload_finalize(
    axum::extract::Path(name): axum::extract::Path<String>,
) -> impl IntoResponse {
    Json(json!({
        "file": {
            "name": format!("files/{}", name),
            "uri": format!("https://generativelanguage.googleapis.com/v1beta/files/{}", name),
            "mimeType": "application/pdf",
            "state": "ACTIVE"
        }
    }))
}

async fn generate_content(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.generate_bodies.lock().unwrap().push(body);

    Json(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": "```json\n{\"summary\":\"s\"}\n```" }]
            },
            "finishReason": "STOP"
        }]
    }))
}

/// Spawn the stub API and return a provider pointed at it plus the
/// recorded generation bodies.
async fn spawn_stub() -> (GeminiTextProvider, Arc<Mutex<Vec<Value>>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let generate_bodies = Arc::new(Mutex::new(Vec::new()));

    let state = StubState {
        base: base.clone(),
        generate_bodies: Arc::clone(&generate_bodies),
    };

    let router = Router::new()
        .route(
            "/v1beta/models",
            get(|| async { Json(json!({"models": []})) }),
        )
        .route("/upload/v1beta/files", post(upload_start))
        .route("/upload-session/:name", post(upload_finalize))
        .route("/v1beta/models/:model_method", post(generate_content))
        .with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let provider = GeminiTextProvider::new(GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-2.5-flash".to_string(),
        api_base: format!("{}/v1beta", base),
        upload_base: format!("{}/upload/v1beta", base),
    });

    (provider, generate_bodies)
}

fn case_file(name: &str) -> CaseFile {
    CaseFile {
        file_name: name.to_string(),
        mime_type: "application/pdf".to_string(),
        content: b"%PDF-1.4".to_vec(),
    }
}

#[tokio::test]
async fn uploads_files_and_returns_model_text() {
    let (provider, bodies) = spawn_stub().await;

    let mut files = BTreeMap::new();
    files.insert("plaintiff".to_string(), case_file("claim_a.pdf"));

    let text = provider
        .generate("act as a judge", &json!({"prompt": "case"}), &files)
        .await
        .expect("generation should succeed");

    assert!(text.contains("\"summary\""));

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);

    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert!(parts[0]["fileData"]["fileUri"]
        .as_str()
        .unwrap()
        .contains("files/claim_a.pdf"));
    // Payload is the final part, serialized back to JSON text
    assert_eq!(parts[1]["text"], json!(r#"{"prompt":"case"}"#));

    assert_eq!(
        bodies[0]["systemInstruction"]["parts"][0]["text"],
        json!("act as a judge")
    );
}

#[tokio::test]
async fn failed_upload_is_skipped_and_generation_proceeds() {
    let (provider, bodies) = spawn_stub().await;

    let mut files = BTreeMap::new();
    files.insert("plaintiff".to_string(), case_file("claim_a.pdf"));
    files.insert("defendant".to_string(), case_file("reject_me.pdf"));

    let result = provider
        .generate("act as a judge", &json!({"prompt": "case"}), &files)
        .await;

    assert!(result.is_ok());

    let bodies = bodies.lock().unwrap();
    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    // One file reference (the rejected upload is skipped) plus the payload
    assert_eq!(parts.len(), 2);
    assert!(parts[0]["fileData"]["fileUri"]
        .as_str()
        .unwrap()
        .contains("claim_a.pdf"));
}

#[tokio::test]
async fn health_check_lists_models_to_verify_the_key() {
    let (provider, _) = spawn_stub().await;

    provider
        .health_check()
        .await
        .expect("health check should succeed against the models endpoint");
}

#[tokio::test]
async fn health_check_fails_without_an_api_key() {
    let provider = GeminiTextProvider::new(GeminiConfig {
        api_key: String::new(),
        model: "gemini-2.5-flash".to_string(),
        api_base: "http://127.0.0.1:9".to_string(),
        upload_base: "http://127.0.0.1:9".to_string(),
    });

    // Rejected at the configuration check, before any network call
    assert!(provider.health_check().await.is_err());
}

#[tokio::test]
async fn request_with_no_files_sends_payload_only() {
    let (provider, bodies) = spawn_stub().await;

    let text = provider
        .generate("act as a judge", &json!("a plain string case"), &BTreeMap::new())
        .await
        .expect("generation should succeed");

    assert!(!text.is_empty());

    let bodies = bodies.lock().unwrap();
    let parts = bodies[0]["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 1);
    // String payloads pass through without re-encoding
    assert_eq!(parts[0]["text"], json!("a plain string case"));
}
