pub mod auth;
pub mod error;
pub mod guard;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod token;
pub mod users;

use chrono::{DateTime, Utc};
use missive_db::DbResult;
use tracing::{error, warn};

use crate::error::ApiError;

/// Run a storage call on the blocking pool. Store calls are the only
/// suspension points in request handling.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {e}");
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}"))
        })?
        .map_err(ApiError::from)
}

/// Timestamps are stored as RFC 3339 text. A row that fails to parse is
/// corrupt; log it and render the current instant instead of failing the
/// whole response.
pub(crate) fn parse_ts(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("corrupt timestamp '{}' in {}: {}", raw, context, e);
        Utc::now()
    })
}
