//! Test fixtures for seeding work-zone blobs.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Raw API key seeded into every test server's key store.
pub const TEST_API_KEY: &str = "test-api-key";

/// Compute SHA-256 hash of data as hex string.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build a metadata map from string pairs.
#[allow(dead_code)]
pub fn meta(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Metadata for a work zone near Boulder, CO with full boundary
/// coordinates and county/state/zip tags.
#[allow(dead_code)]
pub fn boulder_meta(group_id: &str) -> HashMap<String, String> {
    meta(&[
        ("group_id", group_id),
        ("beginning_lat", "40.01"),
        ("beginning_lon", "-105.27"),
        ("ending_lat", "40.02"),
        ("ending_lon", "-105.28"),
        ("county_names", "Boulder"),
        ("state_names", "Colorado"),
        ("zip_code", "80301"),
    ])
}

/// Metadata for a work zone in eastern Kansas, far from Boulder.
#[allow(dead_code)]
pub fn kansas_meta(group_id: &str) -> HashMap<String, String> {
    meta(&[
        ("group_id", group_id),
        ("beginning_lat", "39.0"),
        ("beginning_lon", "-95.0"),
        ("ending_lat", "39.1"),
        ("ending_lon", "-95.1"),
        ("county_names", "Douglas"),
        ("state_names", "Kansas"),
        ("zip_code", "66044"),
    ])
}
