//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOKO_SESSION_SECRET` - Session signing secret (min 32 chars)
//!
//! ## Optional
//! - `SOKO_DATABASE_URL` - SQLite connection string (falls back to
//!   `DATABASE_URL`, then `sqlite:soko.db`)
//! - `SOKO_HOST` - Bind address (default: 127.0.0.1)
//! - `SOKO_PORT` - Listen port (default: 5000)
//! - `SOKO_BASE_URL` - Public URL (default: `http://127.0.0.1:5000`)
//! - `SOKO_ADMIN_PHONE` - Fixed M-PESA number used for admin checkouts
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Sentry error tracking
//!
//! ## M-PESA gateway (all optional at boot)
//!
//! Missing credentials are a *gateway* configuration error reported when a
//! payment is attempted, never a startup crash:
//! - `MPESA_CONSUMER_KEY` / `MPESA_CONSUMER_SECRET` - Daraja app credentials
//! - `MPESA_BUSINESS_SHORTCODE` - Merchant shortcode
//! - `MPESA_PASSKEY` - STK password passkey
//! - `MPESA_CALLBACK_URL` - Public URL of `/mpesa_callback`
//! - `MPESA_AUTH_URL` / `MPESA_STK_PUSH_URL` - Override the sandbox endpoints

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Safaricom sandbox OAuth endpoint.
const DEFAULT_AUTH_URL: &str =
    "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials";

/// Safaricom sandbox STK push endpoint.
const DEFAULT_STK_PUSH_URL: &str =
    "https://sandbox.safaricom.co.ke/mpesa/stkpush/v1/processrequest";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct SokoConfig {
    /// SQLite database connection URL.
    pub database_url: SecretString,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL (used for the secure-cookie decision).
    pub base_url: String,
    /// Session signing secret.
    pub session_secret: SecretString,
    /// Fixed M-PESA number substituted when an admin checks out.
    pub admin_phone: String,
    /// M-PESA gateway configuration.
    pub mpesa: MpesaConfig,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment label.
    pub sentry_environment: Option<String>,
}

/// M-PESA Daraja gateway configuration.
///
/// Credential fields are optional: their absence surfaces as a structured
/// error from the gateway client at call time. Implements `Debug` manually
/// to redact secret fields.
#[derive(Clone)]
pub struct MpesaConfig {
    /// Daraja consumer key (client-credentials exchange).
    pub consumer_key: Option<String>,
    /// Daraja consumer secret (client-credentials exchange).
    pub consumer_secret: Option<SecretString>,
    /// Merchant business shortcode.
    pub shortcode: Option<String>,
    /// Shared passkey used to derive the STK password.
    pub passkey: Option<SecretString>,
    /// Publicly reachable URL for the payment callback.
    pub callback_url: Option<String>,
    /// OAuth token endpoint.
    pub auth_url: String,
    /// STK push endpoint.
    pub stk_push_url: String,
}

impl std::fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("shortcode", &self.shortcode)
            .field("passkey", &self.passkey.as_ref().map(|_| "[REDACTED]"))
            .field("callback_url", &self.callback_url)
            .field("auth_url", &self.auth_url)
            .field("stk_push_url", &self.stk_push_url)
            .finish()
    }
}

impl SokoConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url_from_env();
        let host = get_env_or_default("SOKO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SOKO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SOKO_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SOKO_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("SOKO_BASE_URL", "http://127.0.0.1:5000");
        let session_secret = get_required_secret("SOKO_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SOKO_SESSION_SECRET")?;
        let admin_phone = get_env_or_default("SOKO_ADMIN_PHONE", "0111214624");

        let mpesa = MpesaConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            admin_phone,
            mpesa,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MpesaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let callback_url = get_optional_env("MPESA_CALLBACK_URL");
        if let Some(raw) = &callback_url {
            url::Url::parse(raw).map_err(|e| {
                ConfigError::InvalidEnvVar("MPESA_CALLBACK_URL".to_string(), e.to_string())
            })?;
        }

        Ok(Self {
            consumer_key: get_optional_env("MPESA_CONSUMER_KEY"),
            consumer_secret: get_optional_env("MPESA_CONSUMER_SECRET").map(SecretString::from),
            shortcode: get_optional_env("MPESA_BUSINESS_SHORTCODE"),
            passkey: get_optional_env("MPESA_PASSKEY").map(SecretString::from),
            callback_url,
            auth_url: get_env_or_default("MPESA_AUTH_URL", DEFAULT_AUTH_URL),
            stk_push_url: get_env_or_default("MPESA_STK_PUSH_URL", DEFAULT_STK_PUSH_URL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Resolve the database URL: `SOKO_DATABASE_URL`, then the generic
/// `DATABASE_URL`, then a local SQLite file.
#[must_use]
pub fn database_url_from_env() -> SecretString {
    if let Ok(value) = std::env::var("SOKO_DATABASE_URL") {
        return SecretString::from(value);
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return SecretString::from(value);
    }
    SecretString::from("sqlite:soko.db")
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_mpesa_config() -> MpesaConfig {
        MpesaConfig {
            consumer_key: Some("key".to_string()),
            consumer_secret: Some(SecretString::from("super_secret_consumer")),
            shortcode: Some("174379".to_string()),
            passkey: Some(SecretString::from("super_secret_passkey")),
            callback_url: Some("https://shop.example/mpesa_callback".to_string()),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            stk_push_url: DEFAULT_STK_PUSH_URL.to_string(),
        }
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = SokoConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            base_url: "http://127.0.0.1:5000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            admin_phone: "0111214624".to_string(),
            mpesa: test_mpesa_config(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_mpesa_config_debug_redacts_secrets() {
        let config = test_mpesa_config();
        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("174379"));
        assert!(debug_output.contains("mpesa_callback"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_consumer"));
        assert!(!debug_output.contains("super_secret_passkey"));
    }
}
