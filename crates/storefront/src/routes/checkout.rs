//! Checkout and payment-callback route handlers.
//!
//! Checkout is gated in order: authenticated session, non-empty cart,
//! non-zero recomputed total. The STK push itself is fire-and-forget for
//! the shopper — the cart is cleared and a success notice shown whatever
//! the gateway says — but every attempt is recorded as an order row that
//! the callback endpoint later resolves.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use soko_core::{Price, ProductId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::{Flash, current_user};
use crate::models::Cart;
use crate::routes::PageContext;
use crate::routes::cart::{clear_cart, load_cart};
use crate::services::mpesa::StkCallbackEnvelope;
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub total: String,
    pub admin_phone: String,
    pub is_admin: bool,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub phone_number: Option<String>,
}

/// Total over the cart at *current* prices, skipping stale entries.
async fn compute_total(
    repo: &ProductRepository<'_>,
    cart: &Cart,
) -> Result<Price, RepositoryError> {
    let mut total = Price::ZERO;
    for (key, quantity) in cart.iter() {
        let Ok(id) = key.parse::<i64>() else {
            continue;
        };
        if let Some(product) = repo.get(ProductId::new(id)).await? {
            total = total.saturating_add(product.price.saturating_mul(quantity));
        }
    }
    Ok(total)
}

/// Display the checkout page (first two gates apply here too).
#[instrument(skip(state, session))]
pub async fn page(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let flash = Flash::new(&session);

    let Some(user) = current_user(&session).await? else {
        flash.warning("Please login to checkout.").await?;
        return Ok(Redirect::to("/login").into_response());
    };

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        flash
            .warning("Your cart is empty. Add items before checking out.")
            .await?;
        return Ok(Redirect::to("/").into_response());
    }

    let repo = ProductRepository::new(state.pool());
    let total = compute_total(&repo, &cart).await?;
    let ctx = PageContext::load(&session).await?;

    Ok(CheckoutTemplate {
        ctx,
        total: total.to_string(),
        admin_phone: state.config().admin_phone.clone(),
        is_admin: user.is_admin,
    }
    .into_response())
}

/// Handle checkout submission: recompute the total, push the payment, clear
/// the cart.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let flash = Flash::new(&session);

    let Some(user) = current_user(&session).await? else {
        flash.warning("Please login to checkout.").await?;
        return Ok(Redirect::to("/login").into_response());
    };

    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        flash
            .warning("Your cart is empty. Add items before checking out.")
            .await?;
        return Ok(Redirect::to("/").into_response());
    }

    // Recompute from current product rows; whatever the checkout page
    // displayed earlier is irrelevant, so a concurrent price edit is
    // reflected in the charge.
    let repo = ProductRepository::new(state.pool());
    let total = compute_total(&repo, &cart).await?;
    if total.is_zero() {
        flash
            .warning("Cannot checkout with an empty cart.")
            .await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    // An admin session always pays with the configured store number,
    // whatever was typed into the form.
    let mut phone_number = form.phone_number.unwrap_or_default().trim().to_owned();
    if user.is_admin {
        phone_number = state.config().admin_phone.clone();
        flash
            .info("Admin checkout: Using predefined M-PESA number.")
            .await?;
    }

    if phone_number.is_empty() {
        flash.warning("Phone number is required.").await?;
        return Ok(Redirect::to("/checkout").into_response());
    }

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .create(Some(user.username.as_str()), &phone_number, total)
        .await?;

    // Fire and forget: the outcome is recorded on the order but never
    // changes what the shopper sees.
    match state.mpesa().stk_push(&phone_number, total).await {
        Ok(response) => {
            orders
                .mark_submitted(
                    order.id,
                    &response.merchant_request_id,
                    &response.checkout_request_id,
                )
                .await?;
            tracing::info!(
                order_id = %order.id,
                checkout_request_id = %response.checkout_request_id,
                "STK push submitted"
            );
        }
        Err(error) => {
            tracing::warn!(order_id = %order.id, %error, "STK push failed");
            orders.mark_failed(order.id, &error.to_string()).await?;
        }
    }

    clear_cart(&session).await?;
    flash
        .success(format!(
            "A payment request has been sent to {phone_number}. \
             Please enter your M-PESA PIN to complete the transaction."
        ))
        .await?;

    Ok(Redirect::to("/").into_response())
}

/// Payment gateway callback.
///
/// The gateway POSTs the asynchronous result of a push here. The contract
/// is an unconditional `200 OK`; when the payload is a recognizable STK
/// callback the matching order is resolved, and anything else is logged and
/// dropped.
#[instrument(skip_all)]
pub async fn mpesa_callback(State(state): State<AppState>, body: String) -> &'static str {
    match serde_json::from_str::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => {
            let callback = envelope.body.stk_callback;
            let orders = OrderRepository::new(state.pool());
            match orders
                .resolve_callback(
                    &callback.checkout_request_id,
                    callback.result_code,
                    &callback.result_desc,
                )
                .await
            {
                Ok(true) => tracing::info!(
                    checkout_request_id = %callback.checkout_request_id,
                    result_code = callback.result_code,
                    "Payment callback resolved"
                ),
                Ok(false) => tracing::warn!(
                    checkout_request_id = %callback.checkout_request_id,
                    "Payment callback for unknown order"
                ),
                Err(error) => tracing::error!(%error, "Failed to record payment callback"),
            }
        }
        Err(error) => tracing::warn!(%error, "Unrecognized payment callback payload"),
    }

    "OK"
}
