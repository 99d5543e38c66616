//! API key lookup store for the flagger work-zone data API.
//!
//! Authentication is a single equality check: the SHA-256 hex digest of
//! the presented key either exists in the `api_keys` table or it does
//! not. Key issuance happens out of band; this crate only exposes the
//! lookup plus a seeding helper for bootstrap and tests.

pub mod error;

pub use error::{KeystoreError, KeystoreResult};

use async_trait::async_trait;
use flagger_core::config::KeystoreConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Postgres, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// API key store abstraction.
#[async_trait]
pub trait ApiKeyStore: Send + Sync + 'static {
    /// Check whether a SHA-256 hex digest matches a provisioned key.
    async fn key_hash_exists(&self, key_hash: &str) -> KeystoreResult<bool>;

    /// Provision a key hash (bootstrap and test seeding).
    async fn add_key(&self, key_hash: &str, description: Option<&str>) -> KeystoreResult<()>;

    /// Check database connectivity.
    async fn health_check(&self) -> KeystoreResult<()>;
}

/// SQLite-based key store.
pub struct SqliteKeystore {
    pool: Pool<Sqlite>,
}

impl SqliteKeystore {
    /// Create a new SQLite key store, creating the schema if needed.
    pub async fn new(path: impl AsRef<Path>) -> KeystoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KeystoreError::Config(format!("cannot create {parent:?}: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single
            // connection avoids "database is locked" failures.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> KeystoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS api_keys (
                key_hash TEXT PRIMARY KEY,
                description TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for SqliteKeystore {
    async fn key_hash_exists(&self, key_hash: &str) -> KeystoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = ?)")
                .bind(key_hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn add_key(&self, key_hash: &str, description: Option<&str>) -> KeystoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO api_keys (key_hash, description) VALUES (?, ?)")
            .bind(key_hash)
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> KeystoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// PostgreSQL-based key store.
pub struct PostgresKeystore {
    pool: Pool<Postgres>,
}

impl PostgresKeystore {
    /// Create a new PostgreSQL key store from a connection URL.
    pub async fn from_url(url: &str, max_connections: u32) -> KeystoreResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections).await
    }

    /// Create a new PostgreSQL key store from individual parameters,
    /// allowing credentials to come from the environment.
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        max_connections: u32,
    ) -> KeystoreResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);
        if let Some(user) = username {
            opts = opts.username(user);
        }
        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            "Connecting to PostgreSQL key store"
        );

        Self::connect(opts, max_connections).await
    }

    async fn connect(opts: PgConnectOptions, max_connections: u32) -> KeystoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> KeystoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS api_keys (
                key_hash TEXT PRIMARY KEY,
                description TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for PostgresKeystore {
    async fn key_hash_exists(&self, key_hash: &str) -> KeystoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = $1)")
                .bind(key_hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn add_key(&self, key_hash: &str, description: Option<&str>) -> KeystoreResult<()> {
        sqlx::query(
            "INSERT INTO api_keys (key_hash, description) VALUES ($1, $2)
             ON CONFLICT (key_hash) DO NOTHING",
        )
        .bind(key_hash)
        .bind(description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> KeystoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a key store from configuration.
pub async fn from_config(config: &KeystoreConfig) -> KeystoreResult<Arc<dyn ApiKeyStore>> {
    match config {
        KeystoreConfig::Sqlite { path } => {
            let store = SqliteKeystore::new(path).await?;
            Ok(Arc::new(store))
        }
        KeystoreConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            max_connections,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL key store using connection URL");
                PostgresKeystore::from_url(url, *max_connections).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresKeystore::from_params(
                    host,
                    *port,
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *max_connections,
                )
                .await?
            } else {
                return Err(KeystoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store))
        }
    }
}
