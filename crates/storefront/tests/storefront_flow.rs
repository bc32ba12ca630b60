//! End-to-end tests driving the full router over an in-memory SQLite
//! database, with the session cookie carried between requests the way a
//! browser would.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use secrecy::SecretString;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use soko_core::{OrderStatus, Price, ProductId};
use soko_storefront::config::{MpesaConfig, SokoConfig};
use soko_storefront::db::{self, OrderRepository, ProductRepository};
use soko_storefront::state::AppState;
use soko_storefront::{build_router, middleware};

// Seeded fixtures (see db::seed): "TP-Link Archer C6 WiFi Router" is id 9
// at KSh 5000 in Accessories; the catalog spans Laptops, Desktops and
// Accessories; the admin account is admin/admin.
const ROUTER_ID: i64 = 9;
const ROUTER_NAME: &str = "TP-Link Archer C6 WiFi Router";

fn test_config() -> SokoConfig {
    SokoConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost".to_string(),
        session_secret: SecretString::from("0123456789abcdef0123456789abcdef"),
        admin_phone: "0111214624".to_string(),
        mpesa: MpesaConfig {
            consumer_key: None,
            consumer_secret: None,
            shortcode: None,
            passkey: None,
            callback_url: None,
            // Nothing should ever dial these; missing credentials
            // short-circuit the client first.
            auth_url: "http://127.0.0.1:9/oauth".to_string(),
            stk_push_url: "http://127.0.0.1:9/stkpush".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A router plus a browser-like cookie jar of one.
struct TestApp {
    router: Router,
    pool: SqlitePool,
    cookie: Option<String>,
}

async fn spawn_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    db::run_migrations(&pool).await.unwrap();
    db::seed::run(&pool).await.unwrap();

    let state = AppState::new(test_config(), pool.clone());
    let session_layer = middleware::session_layer(&pool, state.config())
        .await
        .unwrap();
    let router = build_router(state, session_layer);

    TestApp {
        router,
        pool,
        cookie: None,
    }
}

impl TestApp {
    async fn request(&mut self, method: &str, path: &str, form: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie.clone());
        }

        let request = match form {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_owned()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE)
            && let Ok(raw) = set_cookie.to_str()
            && let Some(pair) = raw.split(';').next()
        {
            self.cookie = Some(pair.to_owned());
        }

        response
    }

    async fn get(&mut self, path: &str) -> Response<Body> {
        self.request("GET", path, None).await
    }

    async fn post(&mut self, path: &str, form: &str) -> Response<Body> {
        self.request("POST", path, Some(form)).await
    }

    /// GET a page, assert 200, return the rendered HTML.
    async fn page(&mut self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        body_string(response).await
    }

    async fn register_and_login(&mut self, username: &str, password: &str) {
        let response = self
            .post(
                "/register",
                &format!("username={username}&password={password}"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        self.login(username, password).await;
    }

    async fn login(&mut self, username: &str, password: &str) {
        let response = self
            .post("/login", &format!("username={username}&password={password}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn catalog_groups_products_by_category() {
    let mut app = spawn_app().await;
    let body = app.page("/").await;

    assert!(body.contains("Laptops"));
    assert!(body.contains("Desktops"));
    assert!(body.contains("Accessories"));
    assert!(body.contains(ROUTER_NAME));
    assert!(body.contains("Gaming PC Pro"));
}

#[tokio::test]
async fn category_filter_limits_results() {
    let mut app = spawn_app().await;
    let body = app.page("/?category=Desktops").await;

    assert!(body.contains("Gaming PC Pro"));
    assert!(!body.contains(ROUTER_NAME));
}

#[tokio::test]
async fn unknown_category_yields_empty_result_set() {
    let mut app = spawn_app().await;
    let body = app.page("/?category=Phones").await;

    assert!(!body.contains("Gaming PC Pro"));
    assert!(!body.contains(ROUTER_NAME));
}

#[tokio::test]
async fn search_suppresses_category_filter() {
    let mut app = spawn_app().await;
    // The search term wins; the Desktops filter is ignored.
    let body = app.page("/?q=Archer&category=Desktops").await;

    assert!(body.contains(ROUTER_NAME));
    assert!(!body.contains("Gaming PC Pro"));
}

#[tokio::test]
async fn product_detail_shows_features() {
    let mut app = spawn_app().await;
    let body = app.page(&format!("/product/{ROUTER_ID}")).await;

    assert!(body.contains(ROUTER_NAME));
    assert!(body.contains("Dual Band"));
    assert!(body.contains("KSh 5000.00"));
}

#[tokio::test]
async fn unknown_product_detail_redirects_home_with_notice() {
    let mut app = spawn_app().await;
    let response = app.get("/product/9999").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = app.page("/").await;
    assert!(body.contains("Product not found."));
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn adding_twice_accumulates_and_removing_empties() {
    let mut app = spawn_app().await;

    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let body = app.page("/cart").await;
    assert!(body.contains(ROUTER_NAME));
    assert!(body.contains("value=\"2\""));
    assert!(body.contains("KSh 10000.00"));

    app.get(&format!("/remove_from_cart/{ROUTER_ID}")).await;
    let body = app.page("/cart").await;
    assert!(body.contains("Your cart is empty."));
    assert!(body.contains("removed from cart."));
}

#[tokio::test]
async fn adding_unknown_product_flashes_not_found() {
    let mut app = spawn_app().await;

    let response = app.get("/add_to_cart/9999").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = app.page("/").await;
    assert!(body.contains("Product not found."));
}

#[tokio::test]
async fn removing_absent_item_reports_not_found() {
    let mut app = spawn_app().await;

    app.get(&format!("/remove_from_cart/{ROUTER_ID}")).await;
    let body = app.page("/cart").await;
    assert!(body.contains("Item not found in cart."));
}

#[tokio::test]
async fn non_integer_quantity_is_rejected_and_cart_unchanged() {
    let mut app = spawn_app().await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let response = app
        .post(&format!("/update_cart/{ROUTER_ID}"), "quantity=abc")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = app.page("/cart").await;
    assert!(body.contains("Invalid quantity."));
    assert!(body.contains("value=\"1\""));
}

#[tokio::test]
async fn quantity_update_is_exact_and_zero_removes() {
    let mut app = spawn_app().await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    app.post(&format!("/update_cart/{ROUTER_ID}"), "quantity=5")
        .await;
    let body = app.page("/cart").await;
    assert!(body.contains("value=\"5\""));
    assert!(body.contains("KSh 25000.00"));

    app.post(&format!("/update_cart/{ROUTER_ID}"), "quantity=0")
        .await;
    let body = app.page("/cart").await;
    assert!(body.contains("Your cart is empty."));
}

#[tokio::test]
async fn cart_total_follows_current_product_price() {
    let mut app = spawn_app().await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let body = app.page("/cart").await;
    assert!(body.contains("KSh 5000.00"));

    // A price edit between add-to-cart and viewing shows up immediately:
    // nothing is cached in the session.
    sqlx::query("UPDATE products SET price_cents = ? WHERE id = ?")
        .bind(600_000_i64)
        .bind(ROUTER_ID)
        .execute(&app.pool)
        .await
        .unwrap();

    let body = app.page("/cart").await;
    assert!(body.contains("KSh 6000.00"));
    assert!(!body.contains("KSh 5000.00"));
}

#[tokio::test]
async fn deleted_product_is_skipped_in_cart_view() {
    let mut app = spawn_app().await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    ProductRepository::new(&app.pool)
        .delete(ProductId::new(ROUTER_ID))
        .await
        .unwrap();

    let body = app.page("/cart").await;
    assert!(!body.contains(ROUTER_NAME));
    assert!(body.contains("Your cart is empty."));
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn register_then_login_then_logout() {
    let mut app = spawn_app().await;

    let response = app
        .post("/register", "username=wanjiku&password=secret123")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let body = app.page("/login").await;
    assert!(body.contains("Registration successful. Please login."));

    app.login("wanjiku", "secret123").await;
    let body = app.page("/").await;
    assert!(body.contains("Login successful"));
    assert!(body.contains("wanjiku"));

    app.get("/logout").await;
    let body = app.page("/").await;
    assert!(body.contains("You have been logged out."));
    assert!(!body.contains("wanjiku"));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let mut app = spawn_app().await;

    app.post("/register", "username=wanjiku&password=secret123")
        .await;
    let response = app
        .post("/register", "username=wanjiku&password=other456")
        .await;
    assert_eq!(location(&response), "/register");

    let body = app.page("/register").await;
    assert!(body.contains("Username already exists"));
}

#[tokio::test]
async fn wrong_password_flashes_invalid_credentials() {
    let mut app = spawn_app().await;

    let response = app.post("/login", "username=admin&password=wrong").await;
    assert_eq!(location(&response), "/login");

    let body = app.page("/login").await;
    assert!(body.contains("Invalid credentials"));
}

#[tokio::test]
async fn cart_survives_login_and_logout() {
    let mut app = spawn_app().await;

    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;
    app.register_and_login("wanjiku", "secret123").await;

    let body = app.page("/cart").await;
    assert!(body.contains(ROUTER_NAME));

    app.get("/logout").await;
    let body = app.page("/cart").await;
    assert!(body.contains(ROUTER_NAME));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_requires_login() {
    let mut app = spawn_app().await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let response = app.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn checkout_with_empty_cart_redirects_to_catalog() {
    let mut app = spawn_app().await;
    app.register_and_login("wanjiku", "secret123").await;

    let response = app.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = app.page("/").await;
    assert!(body.contains("Your cart is empty. Add items before checking out."));
}

#[tokio::test]
async fn checkout_clears_cart_and_reports_success_even_when_gateway_fails() {
    let mut app = spawn_app().await;
    app.register_and_login("wanjiku", "secret123").await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    // The gateway is unconfigured, so the push fails - deliberately
    // invisible to the shopper.
    let response = app.post("/checkout", "phone_number=0712345678").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = app.page("/").await;
    assert!(body.contains("A payment request has been sent to 0712345678."));

    let body = app.page("/cart").await;
    assert!(body.contains("Your cart is empty."));

    // But the attempt is on record, marked failed.
    let order = OrderRepository::new(&app.pool)
        .get(soko_core::OrderId::new(1))
        .await
        .unwrap()
        .expect("checkout should have written an order row");
    assert_eq!(order.status, OrderStatus::Failed);
    assert_eq!(order.phone, "0712345678");
    assert_eq!(order.amount, Price::from_shillings(5_000));
}

#[tokio::test]
async fn admin_checkout_substitutes_configured_phone_number() {
    let mut app = spawn_app().await;
    app.login("admin", "admin").await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let response = app.post("/checkout", "phone_number=0799999999").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = app.page("/").await;
    assert!(body.contains("Admin checkout: Using predefined M-PESA number."));
    assert!(body.contains("A payment request has been sent to 0111214624."));
    assert!(!body.contains("0799999999"));
}

#[tokio::test]
async fn checkout_without_phone_number_is_a_validation_error() {
    let mut app = spawn_app().await;
    app.register_and_login("wanjiku", "secret123").await;
    app.get(&format!("/add_to_cart/{ROUTER_ID}")).await;

    let response = app.post("/checkout", "phone_number=").await;
    assert_eq!(location(&response), "/checkout");

    let body = app.page("/checkout").await;
    assert!(body.contains("Phone number is required."));
    // The cart is untouched by a failed validation.
    let body = app.page("/cart").await;
    assert!(body.contains(ROUTER_NAME));
}

// =============================================================================
// Payment callback
// =============================================================================

#[tokio::test]
async fn callback_always_replies_ok() {
    let mut app = spawn_app().await;

    let response = app.post("/mpesa_callback", "{\"unexpected\": true}").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    let response = app.post("/mpesa_callback", "not even json").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_resolves_submitted_order() {
    let mut app = spawn_app().await;

    let pool = app.pool.clone();
    let orders = OrderRepository::new(&pool);
    let order = orders
        .create(Some("wanjiku"), "254712345678", Price::from_shillings(5_000))
        .await
        .unwrap();
    orders
        .mark_submitted(order.id, "29115-34620561-1", "ws_CO_191220191020363925")
        .await
        .unwrap();

    let payload = r#"{
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully."
            }
        }
    }"#;
    let response = app.post("/mpesa_callback", payload).await;
    assert_eq!(response.status(), StatusCode::OK);

    let resolved = orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(resolved.status, OrderStatus::Confirmed);
    assert_eq!(resolved.result_code, Some(0));
}

// =============================================================================
// Admin panel
// =============================================================================

#[tokio::test]
async fn anonymous_visitor_is_redirected_to_login_with_return_path() {
    let mut app = spawn_app().await;

    let response = app.get("/admin/products").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadmin%2Fproducts");
}

#[tokio::test]
async fn non_admin_session_is_redirected_from_admin_views() {
    let mut app = spawn_app().await;
    app.register_and_login("wanjiku", "secret123").await;

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));
}

#[tokio::test]
async fn admin_session_reaches_the_panel() {
    let mut app = spawn_app().await;
    app.login("admin", "admin").await;

    let body = app.page("/admin").await;
    assert!(body.contains("Users"));
    assert!(body.contains("Products"));

    let body = app.page("/admin/products").await;
    assert!(body.contains(ROUTER_NAME));
}

#[tokio::test]
async fn admin_can_create_and_delete_products_and_categories_follow() {
    let mut app = spawn_app().await;
    app.login("admin", "admin").await;

    let response = app
        .post(
            "/admin/products",
            "name=Tablet+X&price=30000&old_price=&rating=&features=Great+screen&image=tablet.jpg&category=Tablets",
        )
        .await;
    assert_eq!(location(&response), "/admin/products");

    // The new category appears in the storefront sidebar...
    let body = app.page("/").await;
    assert!(body.contains("Tablet X"));
    assert!(body.contains("Tablets"));

    let id: i64 = sqlx::query_scalar("SELECT id FROM products WHERE name = 'Tablet X'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    let response = app.post(&format!("/admin/products/{id}/delete"), "").await;
    assert_eq!(location(&response), "/admin/products");

    // ...and disappears with its last product.
    let body = app.page("/").await;
    assert!(!body.contains("Tablets"));
}

#[tokio::test]
async fn admin_product_form_rejects_bad_price() {
    let mut app = spawn_app().await;
    app.login("admin", "admin").await;

    let response = app
        .post(
            "/admin/products",
            "name=Broken&price=cheap&old_price=&rating=&features=&image=x.jpg&category=Misc",
        )
        .await;
    assert_eq!(location(&response), "/admin/products/new");

    let body = app.page("/admin/products/new").await;
    assert!(body.contains("Price:"));
}

#[tokio::test]
async fn admin_can_manage_users() {
    let mut app = spawn_app().await;
    app.login("admin", "admin").await;

    let response = app
        .post(
            "/admin/users",
            "username=newstaff&password=staffpass&is_admin=on",
        )
        .await;
    assert_eq!(location(&response), "/admin/users");

    let body = app.page("/admin/users").await;
    assert!(body.contains("newstaff"));

    let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = 'newstaff'")
        .fetch_one(&app.pool)
        .await
        .unwrap();

    app.post(&format!("/admin/users/{id}/delete"), "").await;
    let body = app.page("/admin/users").await;
    assert!(!body.contains("newstaff"));
}

// =============================================================================
// Contact, seeding, health
// =============================================================================

#[tokio::test]
async fn contact_form_validates_and_accepts() {
    let mut app = spawn_app().await;

    app.post("/contact", "name=&email=&message=").await;
    let body = app.page("/contact").await;
    assert!(body.contains("All fields are required."));

    app.post(
        "/contact",
        "name=Wanjiku&email=w%40example.com&message=Do+you+deliver%3F",
    )
    .await;
    let body = app.page("/contact").await;
    assert!(body.contains("Thanks for reaching out."));
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let app = spawn_app().await;

    let products = ProductRepository::new(&app.pool);
    let before = products.count().await.unwrap();

    db::seed::run(&app.pool).await.unwrap();
    assert_eq!(products.count().await.unwrap(), before);
}

#[tokio::test]
async fn health_endpoints_respond() {
    let mut app = spawn_app().await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}
