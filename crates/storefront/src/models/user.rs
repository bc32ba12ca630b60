//! User domain type.

use soko_core::UserId;

/// A site account.
///
/// The password hash never leaves the database layer; this type is what the
/// rest of the application sees.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Whether this account can reach the admin panel.
    pub is_admin: bool,
}
