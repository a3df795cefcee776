//! Unified error types for the Tessera crates.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Tessera.
///
/// Registry errors propagate synchronously to the caller. Only
/// [`TesseraError::IdentityConflict`] is considered fatal: it means two
/// unrelated subsystems are competing for the same provider name.
#[derive(Error, Debug)]
pub enum TesseraError {
    // ============ Configuration Errors ============
    /// Invalid or unresolvable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Registry Errors ============
    /// A registry entry is bound to a provider of a different kind.
    #[error("Identity conflict for provider '{name}': expected {expected}, found {actual}")]
    IdentityConflict {
        name: String,
        expected: String,
        actual: String,
    },

    /// A composite region key that cannot be decoded.
    #[error("Invalid region key: {0}")]
    InvalidRegionKey(String),

    // ============ Backend Errors ============
    /// Region does not exist on the provider.
    #[error("Region not found: {region} on provider {provider}")]
    RegionNotFound { provider: String, region: String },

    /// The provider was shut down.
    #[error("Provider closed: {0}")]
    ProviderClosed(String),

    /// Failure reported by a cache backend.
    #[error("Backend error: {provider} - {message}")]
    Backend { provider: String, message: String },

    /// Value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::IdentityConflict { .. } => "IDENTITY_CONFLICT",
            Self::InvalidRegionKey(_) => "INVALID_REGION_KEY",
            Self::RegionNotFound { .. } => "REGION_NOT_FOUND",
            Self::ProviderClosed(_) => "PROVIDER_CLOSED",
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an identity conflict error.
    #[must_use]
    pub fn identity_conflict(
        name: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::IdentityConflict {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error must abort the caller instead of being
    /// downgraded to data.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::IdentityConflict { .. })
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}
