//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (query: category, q)
//! GET  /product/{id}           - Product detail
//!
//! # Auth
//! GET|POST /register           - Registration
//! GET|POST /login              - Login (honors ?next= return path)
//! GET  /logout                 - Logout
//!
//! # Cart
//! GET  /add_to_cart/{id}       - Add one unit, redirect back
//! GET  /remove_from_cart/{id}  - Remove entry, redirect to /cart
//! POST /update_cart/{id}       - Set quantity (form: quantity)
//! GET  /cart                   - Cart view with live subtotals
//!
//! # Checkout
//! GET|POST /checkout           - Gated checkout (form: phone_number)
//! POST /mpesa_callback         - Gateway callback (always 200 OK)
//!
//! # Misc
//! GET|POST /contact            - Contact form
//!
//! # Admin (session admin flag required)
//! GET  /admin                  - Dashboard
//! ...  /admin/users, /admin/products - Hand-written CRUD
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{Flash, FlashMessage, current_user};
use crate::models::{Cart, CurrentUser, session_keys};
use crate::state::AppState;

/// Everything the base template needs on every rendered page: the signed-in
/// user, the cart badge count, and pending flash notices.
///
/// Loading a context *consumes* the flashes, so it must only be built by
/// handlers that actually render a page.
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub flashes: Vec<FlashMessage>,
}

impl PageContext {
    /// Load the context from the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, AppError> {
        let user = current_user(session).await?;
        let cart: Cart = session
            .get(session_keys::CART)
            .await?
            .unwrap_or_default();
        let flashes = Flash::new(session).take().await?;

        Ok(Self {
            user,
            cart_count: cart.item_count(),
            flashes,
        })
    }
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(home::home))
        .route("/product/{id}", get(products::show))
        // Auth
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        // Cart
        .route("/add_to_cart/{id}", get(cart::add))
        .route("/remove_from_cart/{id}", get(cart::remove))
        .route("/update_cart/{id}", post(cart::update))
        .route("/cart", get(cart::show))
        // Checkout + payment callback
        .route("/checkout", get(checkout::page).post(checkout::submit))
        .route("/mpesa_callback", post(checkout::mpesa_callback))
        // Contact form
        .route("/contact", get(contact::page).post(contact::submit))
        // Admin panel
        .nest("/admin", admin::routes())
}
