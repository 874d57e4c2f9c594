//! Ledger backend configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which `LedgerStore` implementation backs the contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// Process-local ledger; state is lost on exit.
    #[default]
    Memory,
    /// libSQL file (or `:memory:`) holding world state and key history.
    Libsql,
}

impl LedgerBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Libsql => "libsql",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Database path for the libSQL backend. Ignored by the memory backend.
    #[serde(default)]
    pub path: String,
}

impl LedgerConfig {
    /// Check that the selected backend has what it needs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the libSQL backend has no path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == LedgerBackend::Libsql && self.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ledger.path".into(),
                reason: "required when ledger.backend = \"libsql\"".into(),
            });
        }
        Ok(())
    }
}
