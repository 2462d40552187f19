use axum::{
    Extension, Json,
    extract::{Path, State},
};

use missive_db::models::ProfileRow;
use missive_types::api::{ReceivedMessage, SentMessage, UserDetail, UserProfile};

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

pub async fn list_users(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_users()).await?;

    Ok(Json(rows.into_iter().map(profile).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<UserDetail>> {
    let db = state.clone();
    let target = username.clone();
    let row = blocking(move || db.db.get_user_by_username(&target))
        .await?
        .filter(|row| guard::can_view_user(&identity, Some(row)))
        .ok_or(ApiError::AccessDenied {
            reason: "profile lookup for unknown username",
        })?;

    Ok(Json(UserDetail {
        joined_at: parse_ts(&row.joined_at, "users.joined_at"),
        last_login_at: parse_ts(&row.last_login_at, "users.last_login_at"),
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }))
}

/// Messages addressed to `username`, oldest first, sender expanded.
pub async fn list_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<ReceivedMessage>>> {
    ensure_known_user(&state, &identity, &username, "inbox listing for unknown username").await?;

    let db = state.clone();
    let rows = blocking(move || db.db.list_by_recipient(&username)).await?;

    let messages = rows
        .into_iter()
        .map(|(message, sender)| ReceivedMessage {
            id: message.id,
            body: message.body,
            sent_at: parse_ts(&message.sent_at, "messages.sent_at"),
            read_at: message
                .read_at
                .as_deref()
                .map(|raw| parse_ts(raw, "messages.read_at")),
            from_user: profile(sender),
        })
        .collect();

    Ok(Json(messages))
}

/// Messages sent by `username`, oldest first, recipient expanded.
pub async fn list_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<SentMessage>>> {
    ensure_known_user(&state, &identity, &username, "outbox listing for unknown username").await?;

    let db = state.clone();
    let rows = blocking(move || db.db.list_by_sender(&username)).await?;

    let messages = rows
        .into_iter()
        .map(|(message, recipient)| SentMessage {
            id: message.id,
            body: message.body,
            sent_at: parse_ts(&message.sent_at, "messages.sent_at"),
            read_at: message
                .read_at
                .as_deref()
                .map(|raw| parse_ts(raw, "messages.read_at")),
            to_user: profile(recipient),
        })
        .collect();

    Ok(Json(messages))
}

/// Listing routes key on a username path segment; an unknown one gets the
/// same denial as a permission failure.
async fn ensure_known_user(
    state: &AppState,
    identity: &Identity,
    username: &str,
    reason: &'static str,
) -> ApiResult<()> {
    let db = state.clone();
    let target = username.to_string();
    let row = blocking(move || db.db.get_user_by_username(&target)).await?;

    if !guard::can_view_user(identity, row.as_ref()) {
        return Err(ApiError::AccessDenied { reason });
    }

    Ok(())
}
