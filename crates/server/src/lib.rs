//! HTTP API server for work-zone data files.
//!
//! This crate provides the read-only HTTP surface:
//! - Per-kind file listings with distance and metadata filtering
//! - Work-zone group retrieval (all sibling parts of one record)
//! - API-key authentication middleware
//! - Health and Prometheus metrics endpoints

pub mod auth;
pub mod error;
pub mod group;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod select;
pub mod state;

pub use auth::TraceId;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
