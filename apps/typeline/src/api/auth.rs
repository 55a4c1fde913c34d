//! # Authentication
//!
//! Optional Bearer API key for the compile endpoints.
//!
//! - `TYPELINE_API_KEY` set and non-empty: every route except `/health`
//!   requires `Authorization: Bearer <key>` (a bare `<key>` is accepted too)
//! - unset: all requests pass

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Routes that never require a key (load balancer probes).
const PUBLIC_PATHS: [&str; 1] = ["/health"];

/// Configured API key, if any.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("TYPELINE_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Compare keys in constant time over the longer length.
///
/// Both sides are zero-padded to the same length so the comparison cost
/// does not depend on where or whether the lengths differ.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let len = provided.len().max(expected.len());

    let mut a = vec![0u8; len];
    let mut b = vec![0u8; len];
    a[..provided.len()].copy_from_slice(provided);
    b[..expected.len()].copy_from_slice(expected);

    let same_bytes: bool = a.ct_eq(&b).into();
    same_bytes && provided.len() == expected.len()
}

/// API key middleware.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if keys_match(key, &expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                path = %request.uri().path(),
                "Authentication failed: invalid API key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %request.uri().path(),
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_match() {
        assert!(keys_match("s3cret", "s3cret"));
    }

    #[test]
    fn prefixes_and_extensions_do_not_match() {
        assert!(!keys_match("s3cre", "s3cret"));
        assert!(!keys_match("s3cret!", "s3cret"));
        assert!(!keys_match("", "s3cret"));
    }

    #[test]
    fn trailing_nul_does_not_match_padding() {
        assert!(!keys_match("s3cret\0", "s3cret"));
    }
}
