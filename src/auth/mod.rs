//! Shared-key guard for the admin surface.
//!
//! Admin routes expect the configured key in the `X-Admin-Key` header. The
//! comparison runs in constant time so response timing does not leak how
//! much of a guessed key was right.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::errors::ServiceError;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing admin key")]
    MissingAdminKey,

    #[error("Invalid admin key")]
    InvalidAdminKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::Unauthorized(self.to_string()).into_response()
    }
}

/// The key admin requests must present.
#[derive(Clone)]
pub struct AdminKey(Arc<str>);

impl AdminKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

/// Equality whose running time depends only on the lengths.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.iter().zip(b) {
        res |= x ^ y;
    }
    res == 0
}

/// Rejects requests that do not carry the admin key.
pub async fn admin_key_middleware(
    State(expected): State<AdminKey>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingAdminKey)?;

    if !expected.matches(presented) {
        warn!(uri = %request.uri(), "Rejected admin request with invalid key");
        return Err(AuthError::InvalidAdminKey);
    }

    Ok(next.run(request).await)
}

pub trait AdminRouterExt {
    fn with_admin_key(self, key: AdminKey) -> Self;
}

impl<S> AdminRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_admin_key(self, key: AdminKey) -> Self {
        self.layer(axum::middleware::from_fn_with_state(key, admin_key_middleware))
    }
}
