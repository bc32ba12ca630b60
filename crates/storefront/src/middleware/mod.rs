//! HTTP middleware and request extractors.

pub mod auth;
pub mod flash;
pub mod session;

pub use auth::{RequireAdmin, clear_current_user, current_user, set_current_user};
pub use flash::{Flash, FlashLevel, FlashMessage};
pub use session::session_layer;
