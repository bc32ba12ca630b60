//! Admin panel: hand-written CRUD over users and products.
//!
//! Every handler takes the [`RequireAdmin`] extractor; a session without
//! the admin flag is redirected to `/login?next=<path>`. Each entity has an
//! explicit field allow-list — there is no generated model binding, so a
//! new column never becomes editable by accident.

pub mod products;
pub mod users;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{ProductRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::routes::PageContext;
use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/new", get(users::new_form))
        .route("/users/{id}/edit", get(users::edit_form))
        .route("/users/{id}", post(users::update))
        .route("/users/{id}/delete", post(users::delete))
        // Products
        .route("/products", get(products::list).post(products::create))
        .route("/products/new", get(products::new_form))
        .route("/products/{id}/edit", get(products::edit_form))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/delete", post(products::delete))
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub user_count: i64,
    pub product_count: i64,
}

/// Display the admin dashboard.
#[instrument(skip(state, session))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<DashboardTemplate, AppError> {
    let user_count = UserRepository::new(state.pool()).count().await?;
    let product_count = ProductRepository::new(state.pool()).count().await?;
    let ctx = PageContext::load(&session).await?;

    Ok(DashboardTemplate {
        ctx,
        user_count,
        product_count,
    })
}
