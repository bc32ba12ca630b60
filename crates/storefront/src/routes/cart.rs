//! Cart route handlers.
//!
//! The cart lives entirely in the session as a product-id → quantity map.
//! Prices are never cached in it: the cart view re-reads every product row,
//! so a price edit between add-to-cart and viewing changes the subtotal.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use soko_core::{Price, ProductId};

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::Flash;
use crate::models::{Cart, session_keys};
use crate::routes::PageContext;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session (empty if absent).
pub(crate) async fn load_cart(session: &Session) -> Result<Cart, AppError> {
    Ok(session.get(session_keys::CART).await?.unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Drop the cart from the session entirely.
pub(crate) async fn clear_cart(session: &Session) -> Result<(), AppError> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(())
}

/// Where to send the shopper back to: the referring page, or the catalog.
fn back_url(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| "/".to_owned(), str::to_owned)
}

// =============================================================================
// Cart View
// =============================================================================

/// One row of the cart table.
pub struct CartLine {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub subtotal: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLine>,
    pub total: String,
}

/// Display the cart with live subtotals.
///
/// Entries whose product has been deleted are skipped without error and
/// left in the session.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<CartTemplate, AppError> {
    let cart = load_cart(&session).await?;
    let repo = ProductRepository::new(state.pool());

    let mut lines = Vec::new();
    let mut total = Price::ZERO;
    for (key, quantity) in cart.iter() {
        let Ok(id) = key.parse::<i64>() else {
            continue;
        };
        let Some(product) = repo.get(ProductId::new(id)).await? else {
            continue;
        };

        let subtotal = product.price.saturating_mul(quantity);
        total = total.saturating_add(subtotal);
        lines.push(CartLine {
            id,
            name: product.name,
            price: product.price.to_string(),
            quantity,
            subtotal: subtotal.to_string(),
        });
    }

    let ctx = PageContext::load(&session).await?;

    Ok(CartTemplate {
        ctx,
        lines,
        total: total.to_string(),
    })
}

// =============================================================================
// Mutations
// =============================================================================

/// Add one unit of a product to the cart, then bounce back.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let back = back_url(&headers);

    let Some(product) = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
    else {
        flash.danger("Product not found.").await?;
        return Ok(Redirect::to(&back));
    };

    let mut cart = load_cart(&session).await?;
    cart.add(product.id);
    save_cart(&session, &cart).await?;

    flash
        .info(format!("'{}' added to cart.", product.name))
        .await?;
    Ok(Redirect::to(&back))
}

/// Remove an entry from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);
    let mut cart = load_cart(&session).await?;

    if cart.remove(&id.to_string()) {
        // Look the product up just for the message; a stale entry still
        // removes fine.
        let name = ProductRepository::new(state.pool())
            .get(ProductId::new(id))
            .await?
            .map_or_else(|| "Item".to_owned(), |p| p.name);

        save_cart(&session, &cart).await?;
        flash.info(format!("'{name}' removed from cart.")).await?;
    } else {
        flash.warning("Item not found in cart.").await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: Option<String>,
}

/// Set the quantity of a cart entry exactly.
///
/// A non-integer quantity is a validation error and leaves the cart
/// unchanged; zero or less removes the entry.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    let flash = Flash::new(&session);

    let quantity = form
        .quantity
        .as_deref()
        .map(str::trim)
        .and_then(|q| q.parse::<i64>().ok());
    let Some(quantity) = quantity else {
        flash.danger("Invalid quantity.").await?;
        return Ok(Redirect::to("/cart"));
    };

    let mut cart = load_cart(&session).await?;
    let key = id.to_string();
    if cart.contains(&key) {
        if quantity > 0 {
            cart.set_quantity(&key, u32::try_from(quantity).unwrap_or(u32::MAX));
            flash.success("Cart updated.").await?;
        } else {
            cart.remove(&key);
            flash.info("Item removed from cart.").await?;
        }
        save_cart(&session, &cart).await?;
    }

    Ok(Redirect::to("/cart"))
}
