//! API key authentication for operator endpoints
//!
//! A single shared static key presented in the `X-API-Key` header guards the
//! state-mutating operations. Display endpoints (status, events, static
//! assets) bypass the check as public paths.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Header carrying the operator credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validates a presented credential against the configured secret.
///
/// Stateless; the secret is read once at startup and never rotates.
#[derive(Debug)]
pub struct AuthGate {
    api_key: String,
    public_paths: Vec<String>,
}

impl AuthGate {
    /// New gate for `api_key` with the default public display paths.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            public_paths: vec![
                "/static".to_string(),
                "/health".to_string(),
                "/api/gate/status".to_string(),
                "/api/gate/events".to_string(),
            ],
        }
    }

    /// Check if a path is public (bypasses auth). The landing page is
    /// matched exactly so the prefix rule cannot accidentally open up
    /// every route.
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        path == "/" || self.public_paths.iter().any(|p| path.starts_with(p))
    }

    /// True iff `presented` is non-absent and exactly equals the configured
    /// secret. Comparison is constant-time for equal-length inputs.
    #[must_use]
    pub fn authorize(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        presented.len() == self.api_key.len()
            && bool::from(presented.as_bytes().ct_eq(self.api_key.as_bytes()))
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(auth): State<Arc<AuthGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if auth.is_public_path(path) {
        debug!(path = %path, "Public path, skipping auth");
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if auth.authorize(presented) {
        debug!(path = %path, "Authenticated request");
        next.run(request).await
    } else {
        warn!(path = %path, "Invalid or missing API key");
        unauthorized_response()
    }
}

/// Create a 401 Unauthorized response with the fixed error payload.
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid API key"})),
    )
        .into_response()
}
