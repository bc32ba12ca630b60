//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::SokoConfig;
use crate::services::mpesa::MpesaClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SokoConfig,
    pool: SqlitePool,
    mpesa: MpesaClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: SokoConfig, pool: SqlitePool) -> Self {
        let mpesa = MpesaClient::new(config.mpesa.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mpesa,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &SokoConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the M-PESA gateway client.
    #[must_use]
    pub fn mpesa(&self) -> &MpesaClient {
        &self.inner.mpesa
    }
}
