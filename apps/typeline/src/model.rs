//! # Model Backends
//!
//! Two interchangeable text generators behind `generate(prompt, max_tokens)`:
//!
//! - `Local`: OpenAI-compatible `/completions` endpoint (llama.cpp server etc.)
//! - `Cli`: a chat CLI spawned per prompt, reading the prompt from stdin

use crate::client::{ClientError, HttpClient};
use crate::config::{BackendKind, ModelConfig};
use serde_json::{Value, json};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Sampling temperature of local completions.
const TEMPERATURE: f64 = 0.1;

/// Sequences that end a local completion.
const STOP_SEQUENCES: [&str; 3] = ["```", "##", "Question:"];

/// Instruction passed to the chat CLI alongside the piped prompt.
const CLI_INSTRUCTION: &str = "Output only the completion and nothing else";

/// A configured model backend.
#[derive(Clone)]
pub enum ModelBackend {
    Local { client: HttpClient, model: String },
    Cli { binary: String, model: String },
}

impl ModelBackend {
    pub fn from_config(config: &ModelConfig) -> Self {
        let model = config.model_name().to_string();
        match config.backend {
            BackendKind::Local => Self::Local {
                client: HttpClient::new(&config.url),
                model,
            },
            BackendKind::Cli => Self::Cli {
                binary: config.cli_binary.clone(),
                model,
            },
        }
    }

    /// Human-readable backend summary for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Local { client, model } => {
                format!("local server {} (model: {model})", client.base_url())
            }
            Self::Cli { binary, model } => format!("{binary} CLI (model: {model})"),
        }
    }

    /// Generate a completion for `prompt`.
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ClientError> {
        match self {
            Self::Local { client, model } => {
                let body = json!({
                    "model": model,
                    "prompt": prompt,
                    "max_tokens": max_tokens,
                    "stop": STOP_SEQUENCES,
                    "temperature": TEMPERATURE,
                });
                let reply = client.post_json("/completions", &body).await?;
                completion_text(&reply)
            }
            Self::Cli { binary, model } => run_cli(binary, model, prompt).await,
        }
    }
}

/// Text of a completion reply, in OpenAI or llama.cpp shape.
fn completion_text(reply: &Value) -> Result<String, ClientError> {
    reply
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .or_else(|| reply.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError(format!("no completion text in reply: {reply}")))
}

/// Spawn the chat CLI, pipe the prompt in, return stdout.
async fn run_cli(binary: &str, model: &str, prompt: &str) -> Result<String, ClientError> {
    let mut child = Command::new(binary)
        .args(["--model", model, "-p", CLI_INSTRUCTION])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ClientError::CommandFailed(format!("'{binary}' not found on PATH"))
            }
            _ => ClientError::CommandFailed(format!("cannot spawn '{binary}': {e}")),
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ClientError::CommandFailed("missing stdin pipe".to_string()))?;
    stdin
        .write_all(prompt.as_bytes())
        .await
        .map_err(|e| ClientError::CommandFailed(format!("writing prompt: {e}")))?;
    drop(stdin);

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| ClientError::CommandFailed(format!("waiting for '{binary}': {e}")))?;

    if !output.status.success() {
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(ClientError::CommandFailed(format!(
            "{binary} exited with {code}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
