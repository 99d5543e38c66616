//! Flagger server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use flagger_core::config::AppConfig;
use flagger_keystore::ApiKeyStore;
use flagger_server::{create_router, AppState};
use flagger_storage::BlobStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Flagger - work-zone data file API
#[derive(Parser, Debug)]
#[command(name = "flaggerd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "FLAGGER_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Flagger v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // Check for FLAGGER_ environment variables (excluding FLAGGER_CONFIG which is just the path)
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("FLAGGER_") && key != "FLAGGER_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: flaggerd --config /path/to/config.toml\n  \
             2. Environment variables: FLAGGER_SERVER__BIND=0.0.0.0:8080 \
             FLAGGER_AUTH__CONTACT_EMAIL=ops@example.org flaggerd\n\n\
             See config/server.example.toml for example configuration.\n\
             Set FLAGGER_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("FLAGGER_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    if let Err(e) = config.storage.validate() {
        anyhow::bail!("invalid storage configuration: {e}");
    }

    // Register Prometheus metrics
    flagger_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    // Initialize storage backend
    let storage = flagger_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // Verify storage connectivity before accepting requests.
    // This catches configuration errors and connectivity issues early,
    // preventing the server from reporting healthy when storage is unreachable.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend connectivity verified");

    // Initialize API key store
    let keys = flagger_keystore::from_config(&config.keystore)
        .await
        .context("failed to initialize keystore")?;
    keys.health_check()
        .await
        .context("keystore health check failed")?;
    tracing::info!("API key store initialized");

    // Provision the bootstrap key if configured
    ensure_bootstrap_key(keys.as_ref(), config.auth.bootstrap_key_hash.as_deref()).await?;

    // Create application state
    let state = AppState::new(config.clone(), storage, keys);

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Insert the configured bootstrap key hash so a fresh deployment has
/// one working credential. Idempotent across restarts.
async fn ensure_bootstrap_key(
    keys: &dyn ApiKeyStore,
    bootstrap_key_hash: Option<&str>,
) -> Result<()> {
    let Some(hash) = bootstrap_key_hash else {
        return Ok(());
    };

    let hash = hash.trim().to_ascii_lowercase();
    if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        anyhow::bail!(
            "bootstrap_key_hash must be a 64-character SHA-256 hex digest \
             (generate with: echo -n \"your-key\" | sha256sum)"
        );
    }

    if keys
        .key_hash_exists(&hash)
        .await
        .context("failed to look up bootstrap key")?
    {
        tracing::debug!("Bootstrap key already provisioned");
        return Ok(());
    }

    keys.add_key(&hash, Some("bootstrap key"))
        .await
        .context("failed to provision bootstrap key")?;
    tracing::info!("Bootstrap key provisioned");
    Ok(())
}
