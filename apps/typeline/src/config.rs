//! # Configuration
//!
//! Layered settings, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `typeline.toml` if it exists)
//! 3. Environment variables (`TYPELINE_*`)
//! 4. CLI flags (applied by the `cli` module)
//!
//! ```toml
//! [store]
//! address = "http://localhost:8000"
//! database = "wiki"
//!
//! [model]
//! backend = "cli"
//! model = "claude-sonnet-4-20250514"
//!
//! [embedding]
//! enabled = true
//!
//! [schema]
//! compact = true
//! ```
//!
//! The HTTP API reads its own security variables (`TYPELINE_API_KEY`,
//! `TYPELINE_RATE_LIMIT`, `TYPELINE_CORS_ORIGINS`) when the router is built.

use serde::{Deserialize, Serialize};
use std::path::Path;
use typeline_core::TypelineError;
use typeline_core::primitives::RESERVED_PREFIX;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "typeline.toml";

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub embedding: EmbeddingConfig,
    pub schema: SchemaConfig,
}

/// Graph store connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Base URL of the store's HTTP endpoint.
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8000".to_string(),
            database: "default".to_string(),
            username: "admin".to_string(),
            password: "password".to_string(),
        }
    }
}

/// Which model backend answers prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI-compatible completion server.
    #[default]
    Local,
    /// External chat CLI, prompt on stdin.
    Cli,
}

impl std::str::FromStr for BackendKind {
    type Err = TypelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "cli" => Ok(Self::Cli),
            other => Err(TypelineError::Config(format!(
                "unknown model backend '{other}' (expected 'local' or 'cli')"
            ))),
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub backend: BackendKind,
    /// Base URL of the local completion server.
    pub url: String,
    /// Model name. Empty means the backend's default.
    pub model: String,
    pub max_tokens: u32,
    /// Executable of the chat CLI backend.
    pub cli_binary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            url: "http://localhost:8080/v1".to_string(),
            model: String::new(),
            max_tokens: 4096,
            cli_binary: "claude".to_string(),
        }
    }
}

impl ModelConfig {
    /// The configured model name, or the backend default.
    #[must_use]
    pub fn model_name(&self) -> &str {
        if !self.model.is_empty() {
            return &self.model;
        }
        match self.backend {
            BackendKind::Local => "default",
            BackendKind::Cli => "claude-sonnet-4-20250514",
        }
    }
}

/// Embedding server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    /// Emit embedding statements during `construct`.
    pub enabled: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081/v1".to_string(),
            model: "qwen3-embedding-8b".to_string(),
            enabled: false,
        }
    }
}

/// Schema rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Labels with this prefix never reach a rendered schema.
    pub reserved_prefix: String,
    /// Render the compact form instead of the canonical one.
    pub compact: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: RESERVED_PREFIX.to_string(),
            compact: false,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, TypelineError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, TypelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            TypelineError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(TypelineError::Config(format!(
                "Config file '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            TypelineError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, TypelineError> {
        toml::from_str(text).map_err(|e| TypelineError::Config(format!("Invalid config: {e}")))
    }

    /// Overlay `TYPELINE_*` variables found through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), TypelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TYPELINE_STORE_ADDRESS") {
            self.store.address = v;
        }
        if let Some(v) = get("TYPELINE_DATABASE") {
            self.store.database = v;
        }
        if let Some(v) = get("TYPELINE_STORE_USERNAME") {
            self.store.username = v;
        }
        if let Some(v) = get("TYPELINE_STORE_PASSWORD") {
            self.store.password = v;
        }
        if let Some(v) = get("TYPELINE_MODEL_BACKEND") {
            self.model.backend = v.parse()?;
        }
        if let Some(v) = get("TYPELINE_MODEL_URL") {
            self.model.url = v;
        }
        if let Some(v) = get("TYPELINE_MODEL") {
            self.model.model = v;
        }
        if let Some(v) = get("TYPELINE_EMBEDDING_URL") {
            self.embedding.url = v;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
