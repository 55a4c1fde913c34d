//! # Embedding Backend
//!
//! `HttpEmbedder` calls an OpenAI-compatible `/embeddings` endpoint and
//! encodes the vector as base64 of little-endian `f32`s.
//!
//! The core `Embedder` trait is synchronous. `embed` blocks on the async
//! request through a captured runtime handle, so it must be called from a
//! blocking task (`tokio::task::spawn_blocking`), never from a runtime worker.

use crate::client::{ClientError, HttpClient};
use crate::config::EmbeddingConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Handle;
use typeline_core::{Embedder, TypelineError};

#[derive(Deserialize)]
struct EmbeddingReply {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedding client bound to the runtime it was created on.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: HttpClient,
    model: String,
    runtime: Handle,
}

impl HttpEmbedder {
    /// Create an embedder. Must be called inside a tokio runtime.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ClientError> {
        let runtime = Handle::try_current()
            .map_err(|e| ClientError::CommandFailed(format!("no async runtime: {e}")))?;
        Ok(Self {
            client: HttpClient::new(&config.url),
            model: config.model.clone(),
            runtime,
        })
    }

    /// Fetch and encode the embedding of `text`.
    pub async fn embed_async(&self, text: &str) -> Result<String, ClientError> {
        let body = json!({ "model": self.model, "input": [text] });
        let reply = self.client.post_json("/embeddings", &body).await?;
        let reply: EmbeddingReply =
            serde_json::from_value(reply).map_err(|e| ClientError::ParseError(e.to_string()))?;
        let vector = reply
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::ParseError("embedding reply has no data".to_string()))?;
        Ok(encode_vector(&vector.embedding))
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, label: &str) -> Result<String, TypelineError> {
        self.runtime
            .block_on(self.embed_async(label))
            .map_err(TypelineError::from)
    }
}

/// Base64 of the little-endian `f32` bytes of `values`.
pub fn encode_vector(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}
