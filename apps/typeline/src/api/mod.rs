//! # Typeline HTTP API Module
//!
//! The compilers over HTTP, using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /schema/render` - Prune and render a schema snapshot
//! - `POST /compile` - Compile extraction lines into statements
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `TYPELINE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `TYPELINE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `TYPELINE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use middleware::{DEFAULT_RATE_LIMIT, create_rate_limiter, get_rate_limit_from_env};
pub use types::{CompileRequest, CompileResponse, HealthResponse, RenderRequest, RenderResponse};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use typeline_core::TypelineError;

/// Maximum request body size (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// Compilation keeps no state between requests, so this only carries
/// rendering settings.
#[derive(Clone)]
pub struct AppState {
    /// Labels with this prefix are pruned from rendered schemas.
    pub reserved_prefix: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(reserved_prefix: &str) -> Self {
        Self {
            reserved_prefix: Arc::from(reserved_prefix),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// CORS layer from `TYPELINE_CORS_ORIGINS`.
///
/// - `*`: any origin (warned about)
/// - unset, or no valid entry: localhost only
/// - otherwise: the listed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("TYPELINE_CORS_ORIGINS").ok();

    match origins_env.as_deref().map(str::trim) {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (TYPELINE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) if !origins.is_empty() => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => Some(hv),
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in TYPELINE_CORS_ORIGINS, using localhost");
                return localhost_cors();
            }
            tracing::info!(origins = allowed.len(), "CORS: Allowing configured origins");
            restricted_cors(allowed)
        }
        _ => localhost_cors(),
    }
}

fn localhost_cors() -> CorsLayer {
    let origins = [
        "http://localhost:3000",
        "http://localhost:8090",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8090",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = create_rate_limiter(rate_limit);
    match rate_limiter {
        Some(_) => tracing::info!("Rate limiting enabled: {} requests/second", rate_limit),
        None => tracing::info!("Rate limiting disabled"),
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set TYPELINE_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/schema/render", post(handlers::render_schema_handler))
        .route("/compile", post(handlers::compile_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), TypelineError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TypelineError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Typeline HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| TypelineError::IoError(format!("Server error: {}", e)))
}
