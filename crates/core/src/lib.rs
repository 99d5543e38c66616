//! Shared types for the flagger work-zone data API.
//!
//! This crate provides:
//! - The fixed file-kind catalog (RSM XML, RSM UPER, WZDX GeoJSON)
//! - Public identifier normalization between stored blob names and
//!   caller-facing work-zone ids
//! - Coordinate parsing and great-circle distance
//! - Configuration types shared across crates

pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;

pub use catalog::FileKind;
pub use error::Error;
pub use geo::Coordinate;
