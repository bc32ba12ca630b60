//! Session middleware configuration.
//!
//! Sets up SQLite-backed sessions using tower-sessions, sharing the
//! application's connection pool.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::SokoConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "soko_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with a SQLite store.
///
/// The store's own table is migrated here, so this must run after the pool
/// exists but before the server starts taking requests.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session table cannot be created.
pub async fn session_layer(
    pool: &SqlitePool,
    config: &SokoConfig,
) -> Result<SessionManagerLayer<SqliteStore>, sqlx::Error> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;

    // Only mark the cookie Secure when actually served over HTTPS
    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}
