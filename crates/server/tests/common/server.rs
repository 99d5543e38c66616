//! Server test utilities.

use crate::common::fixtures::{sha256_hash, TEST_API_KEY};
use flagger_core::config::{AppConfig, KeystoreConfig, StorageConfig};
use flagger_keystore::{ApiKeyStore, SqliteKeystore};
use flagger_server::{create_router, AppState};
use flagger_storage::{BlobStore, FilesystemBackend};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    storage: Arc<FilesystemBackend>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage and a single
    /// provisioned API key ([`TEST_API_KEY`]).
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        // Create storage
        let storage_path = temp_dir.path().join("storage");
        let storage = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        // Create keystore and seed the test key
        let db_path = temp_dir.path().join("keys.db");
        let keys: Arc<dyn ApiKeyStore> = Arc::new(
            SqliteKeystore::new(&db_path)
                .await
                .expect("Failed to create key store"),
        );
        keys.add_key(&sha256_hash(TEST_API_KEY.as_bytes()), Some("test key"))
            .await
            .expect("Failed to seed test key");

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: storage_path,
        };
        config.keystore = KeystoreConfig::Sqlite { path: db_path };

        // Create state
        let state = AppState::new(config, storage.clone() as Arc<dyn BlobStore>, keys);

        // Create router
        let router = create_router(state.clone());

        Self {
            router,
            state,
            storage,
            _temp_dir: temp_dir,
        }
    }

    /// Get the concrete filesystem backend for seeding blobs.
    pub fn storage(&self) -> &FilesystemBackend {
        &self.storage
    }

    /// Get the API key store for provisioning additional keys.
    pub fn keys(&self) -> Arc<dyn ApiKeyStore> {
        self.state.keys.clone()
    }
}
