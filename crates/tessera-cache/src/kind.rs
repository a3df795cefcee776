//! Provider kinds.

use crate::provider::CacheProvider;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tessera_core::{TesseraError, TesseraResult};

/// The backend family a provider belongs to.
///
/// The kind name is the first segment of every encoded instance name, so
/// two kinds with the same name compete for the same registry entries.
/// The registry only hands out an instance under a kind the instance
/// itself reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// General purpose application cache.
    EhCache,
    /// Second-level entity cache for ORM sessions.
    ScEhHibernate,
    /// Any other backend family, identified by name.
    Custom(String),
}

impl ProviderKind {
    /// Returns the name used as the encoded instance name prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::EhCache => "EhCache",
            Self::ScEhHibernate => "ScEhHibernate",
            Self::Custom(name) => name,
        }
    }

    /// Maps a kind name back to a kind; unknown names become [`Self::Custom`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "EhCache" => Self::EhCache,
            "ScEhHibernate" => Self::ScEhHibernate,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Creates a custom kind without mapping it to a built-in one.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Returns true if `provider` implements this kind.
    #[must_use]
    pub fn is_satisfied_by(&self, provider: &dyn CacheProvider) -> bool {
        provider.kind() == *self
    }

    /// Rejects names that cannot be used as an instance name prefix.
    pub fn validate(&self) -> TesseraResult<()> {
        let name = self.name();
        if name.trim().is_empty() {
            return Err(TesseraError::configuration("Provider kind name must not be blank"));
        }
        if name.contains(crate::naming::SEPARATOR) {
            return Err(TesseraError::Configuration(format!(
                "Provider kind name '{}' must not contain '{}'",
                name,
                crate::naming::SEPARATOR
            )));
        }
        Ok(())
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
