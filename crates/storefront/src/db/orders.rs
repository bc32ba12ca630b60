//! Order repository for database operations.
//!
//! An order row is written for every checkout attempt before the gateway is
//! contacted; the payment callback resolves it later by
//! `checkout_request_id`. Nothing in the shopper-facing flow reads these
//! rows — they exist so a payment can be reconciled at all.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use soko_core::{OrderId, OrderStatus, Price};

use super::RepositoryError;
use crate::models::order::Order;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    username: Option<String>,
    phone: String,
    amount_cents: i64,
    status: String,
    merchant_request_id: Option<String>,
    checkout_request_id: Option<String>,
    result_code: Option<i64>,
    result_desc: Option<String>,
    created_at: DateTime<Utc>,
}

fn map_row(row: OrderRow) -> Result<Order, RepositoryError> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid order status: {e}")))?;

    Ok(Order {
        id: OrderId::new(row.id),
        username: row.username,
        phone: row.phone,
        amount: Price::from_cents(row.amount_cents),
        status,
        merchant_request_id: row.merchant_request_id,
        checkout_request_id: row.checkout_request_id,
        result_code: row.result_code,
        result_desc: row.result_desc,
        created_at: row.created_at,
    })
}

const SELECT_COLUMNS: &str = "id, username, phone, amount_cents, status, merchant_request_id, \
                              checkout_request_id, result_code, result_desc, created_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if the stored status is unknown.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(map_row).transpose()
    }

    /// Create a pending order for a checkout attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        username: Option<&str>,
        phone: &str,
        amount: Price,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (username, phone, amount_cents, status, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(username)
        .bind(phone)
        .bind(amount.as_cents())
        .bind(OrderStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        map_row(row)
    }

    /// Record the gateway request ids after a successful STK push submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_submitted(
        &self,
        id: OrderId,
        merchant_request_id: &str,
        checkout_request_id: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET merchant_request_id = ?, checkout_request_id = ? WHERE id = ?",
        )
        .bind(merchant_request_id)
        .bind(checkout_request_id)
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Mark an order failed before it ever reached the gateway.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_failed(&self, id: OrderId, detail: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ?, result_desc = ? WHERE id = ?")
            .bind(OrderStatus::Failed.as_str())
            .bind(detail)
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Resolve an order from a gateway callback.
    ///
    /// Result code 0 confirms the payment; anything else fails it.
    ///
    /// # Returns
    ///
    /// Returns `false` when no order matches the `checkout_request_id` (the
    /// callback is acknowledged to the gateway either way).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolve_callback(
        &self,
        checkout_request_id: &str,
        result_code: i64,
        result_desc: &str,
    ) -> Result<bool, RepositoryError> {
        let status = if result_code == 0 {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Failed
        };

        let result = sqlx::query(
            "UPDATE orders SET status = ?, result_code = ?, result_desc = ? \
             WHERE checkout_request_id = ?",
        )
        .bind(status.as_str())
        .bind(result_code)
        .bind(result_desc)
        .bind(checkout_request_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
