//! Admin CRUD handlers for user accounts.
//!
//! Bindable fields: username, password, is_admin. Nothing else.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use soko_core::UserId;

use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::middleware::{Flash, RequireAdmin};
use crate::models::user::User;
use crate::routes::PageContext;
use crate::services::auth;
use crate::state::AppState;

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub users: Vec<User>,
}

/// User create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/user_form.html")]
pub struct UserFormTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: String,
    pub username: String,
    pub is_admin: bool,
    pub editing: bool,
}

/// User form data (the complete allow-list).
#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<String>,
}

/// List all users.
#[instrument(skip(state, session))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<UsersTemplate, AppError> {
    let users = UserRepository::new(state.pool()).list().await?;
    let ctx = PageContext::load(&session).await?;
    Ok(UsersTemplate { ctx, users })
}

/// Display the new-user form.
pub async fn new_form(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<UserFormTemplate, AppError> {
    let ctx = PageContext::load(&session).await?;
    Ok(UserFormTemplate {
        ctx,
        title: "New user".to_owned(),
        action: "/admin/users".to_owned(),
        username: String::new(),
        is_admin: false,
        editing: false,
    })
}

/// Create a user.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Form(form): Form<UserForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    let is_admin = form.is_admin.is_some();

    if username.trim().is_empty() || password.is_empty() {
        flash
            .warning("Username and password are required.")
            .await?;
        return Ok(Redirect::to("/admin/users/new"));
    }

    let password_hash = auth::hash_password(&password)?;
    match UserRepository::new(state.pool())
        .create(username.trim(), &password_hash, is_admin)
        .await
    {
        Ok(user) => {
            flash
                .success(format!("User '{}' created.", user.username))
                .await?;
            Ok(Redirect::to("/admin/users"))
        }
        Err(RepositoryError::Conflict(_)) => {
            flash.warning("Username already exists").await?;
            Ok(Redirect::to("/admin/users/new"))
        }
        Err(other) => Err(other.into()),
    }
}

/// Display the edit form for a user.
#[instrument(skip(state, session))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(user) = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
    else {
        Flash::new(&session).warning("User not found.").await?;
        return Ok(Redirect::to("/admin/users").into_response());
    };

    let ctx = PageContext::load(&session).await?;
    Ok(UserFormTemplate {
        ctx,
        title: format!("Edit user #{id}"),
        action: format!("/admin/users/{id}"),
        username: user.username,
        is_admin: user.is_admin,
        editing: true,
    }
    .into_response())
}

/// Update a user; a blank password leaves the current one in place.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<UserForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let username = form.username.unwrap_or_default();
    let is_admin = form.is_admin.is_some();

    if username.trim().is_empty() {
        flash.warning("Username is required.").await?;
        return Ok(Redirect::to(&format!("/admin/users/{id}/edit")));
    }

    let repo = UserRepository::new(state.pool());
    match repo.update(UserId::new(id), username.trim(), is_admin).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            flash.warning("User not found.").await?;
            return Ok(Redirect::to("/admin/users"));
        }
        Err(RepositoryError::Conflict(_)) => {
            flash.warning("Username already exists").await?;
            return Ok(Redirect::to(&format!("/admin/users/{id}/edit")));
        }
        Err(other) => return Err(other.into()),
    }

    if let Some(password) = form.password.filter(|p| !p.is_empty()) {
        let password_hash = auth::hash_password(&password)?;
        repo.set_password(UserId::new(id), &password_hash).await?;
    }

    flash.success("User updated.").await?;
    Ok(Redirect::to("/admin/users"))
}

/// Delete a user.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    if UserRepository::new(state.pool())
        .delete(UserId::new(id))
        .await?
    {
        flash.success("User deleted.").await?;
    } else {
        flash.warning("User not found.").await?;
    }

    Ok(Redirect::to("/admin/users"))
}
