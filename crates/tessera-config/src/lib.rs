//! # Tessera Config
//!
//! Configuration for Tessera cache providers.
//! Providers are configured from a flat string-keyed property map, which
//! can be assembled by hand or loaded from layered TOML files and
//! environment variables.

mod loader;
mod properties;
mod settings;

pub use loader::*;
pub use properties::*;
pub use settings::*;
