//! Order domain type.

use chrono::{DateTime, Utc};

use soko_core::{OrderId, OrderStatus, Price};

/// A checkout attempt and its payment state.
///
/// Created `Pending` when the shopper submits checkout; the gateway callback
/// (or an immediate client failure) resolves it to `Confirmed` or `Failed`.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Username of the shopper, informational only (no foreign key).
    pub username: Option<String>,
    /// Phone number the payment push was sent to, as submitted.
    pub phone: String,
    /// Total charged, computed from current prices at submission time.
    pub amount: Price,
    /// Payment state.
    pub status: OrderStatus,
    /// Gateway merchant request id, set once the push is accepted.
    pub merchant_request_id: Option<String>,
    /// Gateway checkout request id, the callback correlation key.
    pub checkout_request_id: Option<String>,
    /// Result code from the callback (0 means paid).
    pub result_code: Option<i64>,
    /// Result description from the callback or the client error.
    pub result_desc: Option<String>,
    /// When the checkout was submitted.
    pub created_at: DateTime<Utc>,
}
