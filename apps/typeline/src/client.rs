//! # HTTP Client
//!
//! Thin reqwest wrapper shared by the store, model and embedding clients.

use serde_json::Value;
use thiserror::Error;
use typeline_core::TypelineError;

/// Errors from the collaborator client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the collaborator.
    #[error("Cannot connect to {0}")]
    ConnectionFailed(String),
    /// 401 Unauthorized - invalid or missing credentials.
    #[error("Unauthorized: invalid or missing credentials")]
    Unauthorized,
    /// 429 Too Many Requests.
    #[error("Rate limited: too many requests")]
    RateLimited,
    /// Any other 4xx: the collaborator refused the request.
    #[error("Request rejected ({0}): {1}")]
    Rejected(u16, String),
    /// Server returned a 5xx error.
    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),
    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A spawned command failed to run or exited non-zero.
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl From<ClientError> for TypelineError {
    fn from(err: ClientError) -> Self {
        TypelineError::Upstream(err.to_string())
    }
}

/// JSON-over-HTTP client with optional Bearer auth.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl HttpClient {
    /// Create a client for `base_url`. A trailing `/` is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `Authorization: Bearer <token>` on every following request.
    pub fn set_bearer(&mut self, token: String) {
        self.bearer = Some(token);
    }

    /// POST a JSON body and parse the JSON reply.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let req = self.request(reqwest::Method::POST, path).json(body);
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref token) = self.bearer {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        req.send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Handle HTTP response: check status codes and parse JSON.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Rejected(status.as_u16(), body));
        }
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), body));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(
            HttpClient::new("http://localhost:8000/").base_url(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn client_errors_become_upstream_failures() {
        let err: TypelineError = ClientError::ServerError(503, "busy".to_string()).into();
        assert_eq!(
            err,
            TypelineError::Upstream("Server error (503): busy".to_string())
        );
    }
}
