//! Authentication route handlers.
//!
//! Registration, login, and logout. Login honors a same-site `next` return
//! path planted by the admin gate.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{Flash, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::PageContext;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form and Query Types
// =============================================================================

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub next: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub next: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the registration page.
pub async fn register_page(session: Session) -> Result<RegisterTemplate, AppError> {
    let ctx = PageContext::load(&session).await?;
    Ok(RegisterTemplate { ctx })
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    if username.trim().is_empty() || password.is_empty() {
        flash
            .warning("Username and password are required.")
            .await?;
        return Ok(Redirect::to("/register"));
    }

    match AuthService::new(state.pool())
        .register(&username, &password)
        .await
    {
        Ok(user) => {
            tracing::info!(username = %user.username, "New account registered");
            flash
                .success("Registration successful. Please login.")
                .await?;
            Ok(Redirect::to("/login"))
        }
        Err(AuthError::UserAlreadyExists) => {
            flash.warning("Username already exists").await?;
            Ok(Redirect::to("/register"))
        }
        Err(AuthError::MissingField(field)) => {
            flash.warning(format!("{field} is required.")).await?;
            Ok(Redirect::to("/register"))
        }
        Err(other) => Err(other.into()),
    }
}

/// Display the login page.
pub async fn login_page(
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<LoginTemplate, AppError> {
    let ctx = PageContext::load(&session).await?;
    Ok(LoginTemplate {
        ctx,
        next: query.next,
    })
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    match AuthService::new(state.pool()).login(&username, &password).await {
        Ok(user) => {
            set_current_user(
                &session,
                &CurrentUser {
                    id: user.id,
                    username: user.username.clone(),
                    is_admin: user.is_admin,
                },
            )
            .await?;

            tracing::info!(username = %user.username, "Login");
            flash.success("Login successful").await?;
            Ok(Redirect::to(&safe_next_path(form.next.as_deref())))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %username.trim(), "Failed login attempt");
            flash.danger("Invalid credentials").await?;
            Ok(Redirect::to("/login"))
        }
        Err(other) => Err(other.into()),
    }
}

/// Handle logout.
///
/// Clears the identity only; the cart belongs to the browser session and
/// survives.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    Flash::new(&session)
        .info("You have been logged out.")
        .await?;
    Ok(Redirect::to("/"))
}

/// Clamp a `next` return path to same-site absolute paths.
fn safe_next_path(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_path_accepts_site_paths() {
        assert_eq!(safe_next_path(Some("/admin/products")), "/admin/products");
    }

    #[test]
    fn test_safe_next_path_rejects_offsite_targets() {
        assert_eq!(safe_next_path(Some("https://evil.example")), "/");
        assert_eq!(safe_next_path(Some("//evil.example")), "/");
        assert_eq!(safe_next_path(None), "/");
    }
}
