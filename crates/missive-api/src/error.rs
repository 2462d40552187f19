use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use missive_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, mis-signed, or expired token.
    #[error("authentication required")]
    Unauthenticated,

    /// Login failure. Unknown username and wrong password share this
    /// variant so the response carries no enumeration signal.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not permitted for this resource.
    #[error("forbidden")]
    Forbidden,

    /// Username-based lookups fold "no such user" into the same rejection
    /// as "not permitted", so username existence is indistinguishable from
    /// permission at the boundary. The reason is logged server-side only.
    #[error("access denied")]
    AccessDenied { reason: &'static str },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("username already taken")]
    DuplicateUsername,

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// Message creation against a nonexistent recipient. The surrounding
    /// system never validates this input before the write, so it surfaces
    /// as an internal failure, not a client error.
    #[error("message recipient does not exist")]
    RecipientNotFound,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateUsername => ApiError::DuplicateUsername,
            DbError::UnknownRecipient => ApiError::RecipientNotFound,
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateUsername => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RecipientNotFound | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            ApiError::AccessDenied { reason } => {
                warn!("access denied: {}", reason);
                "access denied".to_string()
            }
            ApiError::RecipientNotFound => {
                error!("{}", self);
                "internal server error".to_string()
            }
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
