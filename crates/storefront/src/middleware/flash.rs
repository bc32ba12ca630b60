//! One-shot flash notices carried in the session.
//!
//! A flash is pushed by the handler that performs an action and consumed by
//! the next rendered page. Redirects never consume flashes, so a message
//! pushed before a redirect appears on the page the redirect lands on.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash notice, mapped to a CSS class when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    /// CSS class suffix used by the base template.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A single pending notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

/// Handle for pushing and draining flash notices on a session.
#[derive(Clone)]
pub struct Flash {
    session: Session,
}

impl Flash {
    /// Wrap a session handle.
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
        }
    }

    /// Append a notice for the next rendered page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn push(
        &self,
        level: FlashLevel,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        let mut messages: Vec<FlashMessage> = self
            .session
            .get(session_keys::FLASH)
            .await?
            .unwrap_or_default();

        messages.push(FlashMessage {
            level,
            message: message.into(),
        });

        self.session.insert(session_keys::FLASH, &messages).await
    }

    /// Append a success notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn success(
        &self,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        self.push(FlashLevel::Success, message).await
    }

    /// Append an informational notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn info(
        &self,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        self.push(FlashLevel::Info, message).await
    }

    /// Append a warning notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn warning(
        &self,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        self.push(FlashLevel::Warning, message).await
    }

    /// Append an error notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn danger(
        &self,
        message: impl Into<String>,
    ) -> Result<(), tower_sessions::session::Error> {
        self.push(FlashLevel::Danger, message).await
    }

    /// Drain all pending notices for rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn take(&self) -> Result<Vec<FlashMessage>, tower_sessions::session::Error> {
        Ok(self
            .session
            .remove(session_keys::FLASH)
            .await?
            .unwrap_or_default())
    }
}
