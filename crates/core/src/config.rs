//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Blob storage backend.
    #[serde(default)]
    pub storage: StorageConfig,
    /// API key store.
    #[serde(default)]
    pub keystore: KeystoreConfig,
}

impl AppConfig {
    /// Create a test configuration backed by local paths.
    ///
    /// **For testing only.** Storage and keystore paths still need to
    /// be pointed at a temp directory by the caller.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig {
                header_name: default_header_name(),
                contact_email: "wzdc-support@example.org".to_string(),
                bootstrap_key_hash: None,
            },
            storage: StorageConfig::default(),
            keystore: KeystoreConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping.
    /// When enabled, restrict access to scraper IPs at the network level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Authentication configuration.
///
/// The API accepts a single pre-shared key per caller, presented as a
/// plain header value and matched against the keystore by SHA-256 hex
/// digest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Request header carrying the API key.
    #[serde(default = "default_header_name")]
    pub header_name: String,
    /// Contact address included in the missing-key guidance message.
    pub contact_email: String,
    /// Pre-computed SHA-256 hex digest of a key to provision at
    /// startup, so a fresh deployment has one working credential.
    /// Generate with: `echo -n "your-secret-key" | sha256sum`
    #[serde(default)]
    pub bootstrap_key_hash: Option<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_header_name() -> String {
    "auth_key".to_string()
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage (metadata kept in JSON sidecars).
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to the ambient credential
        /// chain if not set. Prefer env vars or IAM roles over config.
        access_key_id: Option<String>,
        /// AWS secret access key. See access_key_id.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key`). Required for
        /// MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            _ => Ok(()),
        }
    }
}

/// API key store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeystoreConfig {
    /// SQLite database (recommended for testing and small deployments).
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (takes precedence over individual fields).
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: u16,
        /// Database user.
        username: Option<String>,
        /// Database password. Prefer env vars over config files.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// Maximum pool connections.
        #[serde(default = "default_pg_max_connections")]
        max_connections: u32,
    },
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/keys.db"),
        }
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_max_connections() -> u32 {
    5
}
