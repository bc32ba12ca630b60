//! Authentication middleware and extractors.
//!
//! Provides the admin capability gate and helpers for reading and writing
//! the logged-in user in the session.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an admin session.
///
/// This is the only authorization check in the system: every admin view is
/// accessible exactly when the session's admin flag is true. Anyone else is
/// redirected to the login page with a return-path hint.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Rejection for [`RequireAdmin`]: redirect to login, remembering where the
/// visitor was headed.
pub struct AdminRejection {
    next: String,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let target = format!("/login?next={}", urlencoding::encode(&self.next));
        Redirect::to(&target).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped path; OriginalUri has the real one
        let next = parts.extensions.get::<OriginalUri>().map_or_else(
            || parts.uri.path().to_owned(),
            |uri| uri.path().to_owned(),
        );

        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(AdminRejection { next });
        };

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        match user {
            Some(user) if user.is_admin => Ok(Self(user)),
            _ => Err(AdminRejection { next }),
        }
    }
}

/// Read the current user from the session, if logged in.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn current_user(
    session: &Session,
) -> Result<Option<CurrentUser>, tower_sessions::session::Error> {
    session.get(session_keys::CURRENT_USER).await
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// The cart stays: it belongs to the browser session, not the account.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
