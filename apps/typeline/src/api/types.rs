//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use typeline_core::{Compilation, CompileStats, SchemaForm, SchemaSnapshot};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// SCHEMA RENDER REQUEST/RESPONSE
// =============================================================================

/// Schema render request: a snapshot plus the wanted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(flatten)]
    pub snapshot: SchemaSnapshot,
    #[serde(default)]
    pub form: SchemaForm,
}

/// Schema render response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderResponse {
    pub fn success(schema: String) -> Self {
        Self {
            success: true,
            schema: Some(schema),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            schema: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// COMPILE REQUEST/RESPONSE
// =============================================================================

/// Compile request: extraction-line text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileRequest {
    pub lines: String,
}

/// Compile response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(default)]
    pub statements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CompileStats>,
    /// 1-based number of the malformed line, if that was the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompileResponse {
    pub fn success(compilation: Compilation) -> Self {
        Self {
            success: true,
            statements: compilation.statements.into_iter().map(|s| s.0).collect(),
            stats: Some(compilation.stats),
            line: None,
            error: None,
        }
    }

    pub fn error(line: Option<usize>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            statements: Vec::new(),
            stats: None,
            line,
            error: Some(msg.into()),
        }
    }
}
