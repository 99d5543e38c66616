//! Authentication middleware.
//!
//! Every data route requires a pre-shared API key, presented as a plain
//! header value (default `auth_key`). The gate hashes the value with
//! SHA-256 and checks the hex digest against the key store. Any failure
//! along the way — missing header, undecodable value, lookup error —
//! rejects the request; a lookup error is never surfaced as a server
//! error (fails closed).

use crate::error::ApiError;
use crate::metrics::AUTH_FAILURES_TOTAL;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs. Longer values are truncated to prevent
/// log bloat and log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value, truncated and
    /// filtered to printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Hash an API key for keystore lookup.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Authentication middleware guarding the data routes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    let header_name = state.config.auth.header_name.as_str();
    let presented = req
        .headers()
        .get(header_name)
        .and_then(|v| v.to_str().ok());

    let Some(key) = presented else {
        AUTH_FAILURES_TOTAL.with_label_values(&["missing"]).inc();
        return Err(ApiError::Unauthorized(format!(
            "No authentication key was specified. If you have a key, add \
             {header_name}: <authentication_key> to your request header. If you do not \
             have a key, email {} to get one.",
            state.config.auth.contact_email
        )));
    };

    let authorized = match state.keys.key_hash_exists(&hash_key(key)).await {
        Ok(found) => found,
        Err(e) => {
            // Lookup failures look identical to a wrong key from the
            // caller's side.
            tracing::warn!(error = %e, "key lookup failed, rejecting request");
            false
        }
    };

    if !authorized {
        AUTH_FAILURES_TOTAL.with_label_values(&["invalid"]).inc();
        return Err(ApiError::Unauthorized(
            "Invalid authentication key".to_string(),
        ));
    }

    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}

// Note: hex is a simple utility, we'll inline it
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}
