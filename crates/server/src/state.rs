//! Application state shared across handlers.

use flagger_core::config::AppConfig;
use flagger_keystore::ApiKeyStore;
use flagger_storage::BlobStore;
use std::sync::Arc;

/// Shared application state.
///
/// Everything here is immutable after startup; requests share the
/// storage and keystore clients but hold no mutable state of their own.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Blob storage backend.
    pub storage: Arc<dyn BlobStore>,
    /// API key store.
    pub keys: Arc<dyn ApiKeyStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn BlobStore>,
        keys: Arc<dyn ApiKeyStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            keys,
        }
    }
}
