use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// Verified requester identity: the username bound into a valid token.
/// Constructed only by token verification, so authorization checks are
/// never handed a raw, unverified string.
#[derive(Debug, Clone)]
pub struct Identity(String);

impl Identity {
    pub(crate) fn new(username: String) -> Self {
        Self(username)
    }

    pub fn username(&self) -> &str {
        &self.0
    }
}

/// Extract and validate the bearer token from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    let identity = state.tokens.verify(token)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
