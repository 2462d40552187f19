use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use missive_api::auth::AppStateInner;
use missive_api::routes::router;
use missive_api::token::TokenKeys;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "missive=debug,tower_http=debug".into()),
        )
        .init();

    // Config. The signing secret is read once here and lives in shared
    // state for the life of the process; rotation is a redeploy.
    let jwt_secret =
        std::env::var("MISSIVE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("MISSIVE_DB_PATH").unwrap_or_else(|_| "missive.db".into());
    let host = std::env::var("MISSIVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MISSIVE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let token_ttl_secs: i64 = std::env::var("MISSIVE_TOKEN_TTL_SECS")
        .unwrap_or_else(|_| "86400".into())
        .parse()?;

    // Init database
    let db = missive_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state = Arc::new(AppStateInner {
        db,
        tokens: TokenKeys::new(&jwt_secret, Duration::seconds(token_ttl_secs)),
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Missive server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
