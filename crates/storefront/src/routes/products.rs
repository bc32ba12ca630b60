//! Product detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use soko_core::ProductId;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::Flash;
use crate::routes::PageContext;
use crate::routes::home::ProductCard;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub product: ProductCard,
}

/// Display a single product.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());

    let Some(product) = repo.get(ProductId::new(id)).await? else {
        Flash::new(&session).danger("Product not found.").await?;
        return Ok(Redirect::to("/").into_response());
    };

    let ctx = PageContext::load(&session).await?;

    Ok(ProductTemplate {
        ctx,
        product: ProductCard::from(&product),
    }
    .into_response())
}
