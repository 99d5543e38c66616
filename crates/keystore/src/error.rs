//! Keystore error types.

use thiserror::Error;

/// Key lookup errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for keystore operations.
pub type KeystoreResult<T> = std::result::Result<T, KeystoreError>;
