//! # Tessera Core
//!
//! Core types and error definitions shared by the Tessera crates.
//! This crate provides the error taxonomy, offset-based pagination,
//! and tracing setup used by the configuration and cache layers.

pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;

pub use error::*;
pub use pagination::*;
pub use result::*;
pub use telemetry::*;
