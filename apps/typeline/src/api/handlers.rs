//! # API Endpoint Handlers

use super::{
    AppState,
    types::{CompileRequest, CompileResponse, HealthResponse, RenderRequest, RenderResponse},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use typeline_core::{LineCompiler, TypelineError};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// SCHEMA HANDLER
// =============================================================================

/// Prune and render a posted schema snapshot.
pub async fn render_schema_handler(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.snapshot.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(RenderResponse::error(e.to_string())),
        );
    }
    let schema = request.snapshot.prune(&state.reserved_prefix);
    let text = schema.render(request.form);
    tracing::debug!(types = schema.type_count(), form = ?request.form, "Schema rendered");
    (StatusCode::OK, Json(RenderResponse::success(text)))
}

// =============================================================================
// COMPILE HANDLER
// =============================================================================

/// Compile extraction lines with a fresh session. No embeddings are emitted.
pub async fn compile_handler(Json(request): Json<CompileRequest>) -> impl IntoResponse {
    match LineCompiler::new().compile_text(&request.lines) {
        Ok(compilation) => (StatusCode::OK, Json(CompileResponse::success(compilation))),
        Err(e @ TypelineError::MalformedLine { line, .. }) => (
            StatusCode::BAD_REQUEST,
            Json(CompileResponse::error(Some(line), e.to_string())),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CompileResponse::error(None, format!("Compile failed: {e}"))),
        ),
    }
}
