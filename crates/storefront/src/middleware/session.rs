//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pc_session";

/// Session expiry time in seconds (14 days).
const SESSION_EXPIRY_SECONDS: i64 = 14 * 24 * 60 * 60;

/// The `PostgreSQL` session store.
///
/// The `tower_sessions.session` table is created by the storefront
/// migrations, not at startup.
#[must_use]
pub fn postgres_session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer over any session store.
///
/// Cookies are marked `Secure` when the storefront is served over HTTPS.
#[must_use]
pub fn create_session_layer<S>(store: S, base_url: &str) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let is_secure = base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Queue a one-shot message for the next cart page render.
///
/// Failures are logged and otherwise ignored; losing a message never blocks
/// the redirect that follows.
pub async fn set_flash(session: &tower_sessions::Session, message: &str) {
    if let Err(e) = session
        .insert(crate::models::session_keys::FLASH, message)
        .await
    {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

/// Take the pending one-shot message, if any.
pub async fn take_flash(session: &tower_sessions::Session) -> Option<String> {
    session
        .remove::<String>(crate::models::session_keys::FLASH)
        .await
        .ok()
        .flatten()
}
