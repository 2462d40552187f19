use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use missive_db::Database;
use missive_types::api::{LoginRequest, RegisterRequest, TokenResponse};

use crate::blocking;
use crate::error::{ApiError, ApiResult};
use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
}

/// Create a user and hand back a token: registration doubles as the first
/// authentication. A losing race on the username surfaces as a conflict.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(ApiError::BadRequest("username must be 3-32 characters"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let db = state.clone();
    let user = blocking(move || {
        db.db.create_user(
            &req.username,
            &password_hash,
            &req.first_name,
            &req.last_name,
            &req.phone,
        )
    })
    .await?;

    let token = state.tokens.sign(&user.username)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Verify credentials and issue a token. An unknown username and a wrong
/// password answer identically.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let db = state.clone();
    let username = req.username.clone();
    let user = blocking(move || db.db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unparseable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let db = state.clone();
    let username = user.username.clone();
    blocking(move || db.db.touch_login(&username)).await?;

    let token = state.tokens.sign(&user.username)?;
    Ok(Json(TokenResponse { token }))
}
