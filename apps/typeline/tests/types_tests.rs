//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use typeline::api::{CompileRequest, CompileResponse, HealthResponse, RenderRequest, RenderResponse};
use typeline_core::{LineCompiler, SchemaForm};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// RENDER REQUEST/RESPONSE TESTS
// =============================================================================

#[test]
fn test_render_request_defaults_to_canonical() {
    let json = r#"{"entities":["person"]}"#;
    let request: RenderRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.form, SchemaForm::Canonical);
    assert_eq!(request.snapshot.entities.len(), 1);
    assert!(request.snapshot.owns.is_empty());
}

#[test]
fn test_render_request_compact_form() {
    let json = r#"{"relations":["parentage"],"form":"compact"}"#;
    let request: RenderRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.form, SchemaForm::Compact);
    assert_eq!(request.snapshot.relations[0].as_str(), "parentage");
}

#[test]
fn test_render_request_unknown_form_rejected() {
    let json = r#"{"form":"fancy"}"#;
    assert!(serde_json::from_str::<RenderRequest>(json).is_err());
}

#[test]
fn test_render_response_omits_absent_fields() {
    let json = serde_json::to_string(&RenderResponse::success("define".to_string())).unwrap();
    assert_eq!(json, r#"{"success":true,"schema":"define"}"#);

    let json = serde_json::to_string(&RenderResponse::error("bad")).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"bad"}"#);
}

// =============================================================================
// COMPILE REQUEST/RESPONSE TESTS
// =============================================================================

#[test]
fn test_compile_request_deserialization() {
    let request: CompileRequest = serde_json::from_str(r#"{"lines":"entity a"}"#).unwrap();
    assert_eq!(request.lines, "entity a");
}

#[test]
fn test_compile_response_from_compilation() {
    let compilation = LineCompiler::new()
        .compile_text("entity person:x\nproperty person:x age:x 42")
        .unwrap();
    let response = CompileResponse::success(compilation);

    assert!(response.success);
    assert_eq!(response.statements.len(), 2);
    let stats = response.stats.unwrap();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.properties, 1);

    let json = serde_json::to_string(&response).unwrap();
    assert!(!json.contains("\"error\""));
    assert!(!json.contains("\"line\""));
}

#[test]
fn test_compile_response_error_carries_line() {
    let response = CompileResponse::error(Some(3), "Malformed line 3");
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["line"], 3);
    assert_eq!(json["statements"], serde_json::json!([]));
    assert!(json.get("stats").is_none());
}
