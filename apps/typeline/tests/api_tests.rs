//! Integration tests for the Typeline HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use serde_json::json;
use std::sync::Mutex;
use typeline::api::{AppState, CompileResponse, HealthResponse, RenderResponse, create_router};

/// Mutex to serialize tests since they modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("TYPELINE_API_KEY") };
    }
}

/// Create a test server without authentication.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("TYPELINE_API_KEY") };
    let router = create_router(AppState::new("meta-"));
    (TestServer::new(router).unwrap(), TestGuard { _guard: guard })
}

/// Create a test server with authentication enabled.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("TYPELINE_API_KEY", api_key) };
    let router = create_router(AppState::new("meta-"));
    (TestServer::new(router).unwrap(), TestGuard { _guard: guard })
}

fn person_snapshot() -> serde_json::Value {
    json!({
        "entities": ["person", "meta-document"],
        "attributes": ["name", "meta-page-title"],
        "owns": [
            { "owner": "person", "attribute": "name" },
            { "owner": "meta-document", "attribute": "meta-page-title" }
        ]
    })
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// SCHEMA RENDER TESTS
// =============================================================================

#[tokio::test]
async fn test_render_canonical_prunes_reserved_labels() {
    let (server, _guard) = create_test_server();

    let response = server.post("/schema/render").json(&person_snapshot()).await;

    response.assert_status_ok();
    let body: RenderResponse = response.json();
    assert!(body.success);
    assert_eq!(
        body.schema.as_deref(),
        Some("define\nentity person;\nattribute name;\nperson owns name;")
    );
}

#[tokio::test]
async fn test_render_compact() {
    let (server, _guard) = create_test_server();

    let mut request = person_snapshot();
    request["form"] = json!("compact");
    let response = server.post("/schema/render").json(&request).await;

    response.assert_status_ok();
    let body: RenderResponse = response.json();
    assert_eq!(
        body.schema.as_deref(),
        Some("$var isa person;\n# Has\nperson has name;")
    );
}

#[tokio::test]
async fn test_render_empty_snapshot() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/schema/render")
        .json(&json!({ "form": "compact" }))
        .await;

    response.assert_status_ok();
    let body: RenderResponse = response.json();
    assert_eq!(body.schema.as_deref(), Some(""));
}

#[tokio::test]
async fn test_render_rejects_duplicate_labels() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/schema/render")
        .json(&json!({ "entities": ["person"], "relations": ["person"] }))
        .await;

    assert_eq!(response.status_code().as_u16(), 422);
    let body: RenderResponse = response.json();
    assert!(!body.success);
    assert!(body.error.unwrap().contains("person"));
}

// =============================================================================
// COMPILE TESTS
// =============================================================================

#[tokio::test]
async fn test_compile_with_provenance() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/compile")
        .json(&json!({
            "lines": "source Some Title\nentity person:x\nentity person:x"
        }))
        .await;

    response.assert_status_ok();
    let body: CompileResponse = response.json();
    assert!(body.success);
    assert_eq!(
        body.statements,
        vec![
            "put $doc-some-title isa meta-document, has meta-page-title \"Some Title\";",
            "put $person-x isa entity-node, has node-label \"person:x\";",
            "put $_ isa meta-knowledge-source, links (knowledge: $person-x, source: $doc-some-title);",
        ]
    );
    let stats = body.stats.unwrap();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.embeddings, 0);
}

#[tokio::test]
async fn test_compile_requests_do_not_share_sessions() {
    let (server, _guard) = create_test_server();
    let request = json!({ "lines": "entity person:x" });

    let first: CompileResponse = server.post("/compile").json(&request).await.json();
    let second: CompileResponse = server.post("/compile").json(&request).await.json();

    assert_eq!(first.statements.len(), 1);
    assert_eq!(first.statements, second.statements);
}

#[tokio::test]
async fn test_compile_malformed_line_reports_line_number() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "entity person:x\nentity" }))
        .await;

    response.assert_status_bad_request();
    let body: CompileResponse = response.json();
    assert!(!body.success);
    assert_eq!(body.line, Some(2));
    assert!(body.statements.is_empty());
}

#[tokio::test]
async fn test_compile_missing_field_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/compile")
        .json(&json!({ "text": "entity person:x" }))
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "x".repeat(3 * 1024 * 1024) }))
        .await;

    assert_eq!(response.status_code().as_u16(), 413);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    // /compile is POST only
    let response = server.get("/compile").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "entity person:x" }))
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .post("/schema/render")
        .json(&person_snapshot())
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("correct-key");

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "entity person:x" }))
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("required-key");

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "entity person:x" }))
        .await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let (server, _guard) = create_auth_test_server("actual-key");

    let response = server
        .post("/compile")
        .json(&json!({ "lines": "entity person:x" }))
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let (server, _guard) = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}
