//! Core types for Soko.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod phone;
pub mod price;
pub mod status;

pub use id::*;
pub use phone::{Msisdn, MsisdnError};
pub use price::{Price, PriceError};
pub use status::{OrderStatus, ParseOrderStatusError};
