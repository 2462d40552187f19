use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use missive_db::models::ProfileRow;
use missive_types::api::{
    MarkReadResponse, MessageCreated, MessageDetail, SendMessageRequest, UserProfile,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::guard;
use crate::middleware::Identity;
use crate::{blocking, parse_ts};

fn profile(row: ProfileRow) -> UserProfile {
    UserProfile {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }
}

/// Create a message from the authenticated sender. The recipient is not
/// validated up front; a nonexistent one trips the store's foreign key and
/// surfaces as an internal failure with nothing persisted.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.body.is_empty() {
        return Err(ApiError::BadRequest("message body must not be empty"));
    }

    let db = state.clone();
    let from = identity.username().to_string();
    let message =
        blocking(move || db.db.insert_message(&from, &req.to_username, &req.body)).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageCreated {
            id: message.id,
            from_username: message.from_username,
            to_username: message.to_username,
            body: message.body,
            sent_at: parse_ts(&message.sent_at, "messages.sent_at"),
        }),
    ))
}

/// Fetch one message with both parties expanded. Absence is 404; a
/// requester who is neither party gets a plain denial, never the body.
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<MessageDetail>> {
    let db = state.clone();
    let (message, from_user, to_user) = blocking(move || db.db.get_message_with_parties(id))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    if !guard::can_view_message(&identity, &message) {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(MessageDetail {
        id: message.id,
        body: message.body,
        sent_at: parse_ts(&message.sent_at, "messages.sent_at"),
        read_at: message
            .read_at
            .as_deref()
            .map(|raw| parse_ts(raw, "messages.read_at")),
        from_user: profile(from_user),
        to_user: profile(to_user),
    }))
}

/// Transition a message to read. Recipient-only; the sender is refused
/// like any third party. Repeat calls succeed and overwrite the timestamp
/// (the write itself is isolated in the store's `set_read`).
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<MarkReadResponse>> {
    let db = state.clone();
    let message = blocking(move || db.db.get_message(id))
        .await?
        .ok_or(ApiError::NotFound("message"))?;

    if !guard::can_mark_read(&identity, &message) {
        return Err(ApiError::Forbidden);
    }

    let read_at = Utc::now();
    let db = state.clone();
    let stamp = read_at.to_rfc3339();
    blocking(move || db.db.set_read(id, &stamp)).await?;

    Ok(Json(MarkReadResponse { id, read_at }))
}
