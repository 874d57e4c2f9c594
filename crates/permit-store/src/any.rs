//! Backend selection from configuration.

use permit_config::{LedgerBackend, LedgerConfig};
use permit_core::tx::TxHeader;

use crate::error::LedgerError;
use crate::selector::Selector;
use crate::{KeyModification, LedgerStore, LibsqlLedger, MemoryLedger, StateEntry, VersionedValue};

/// One of the shipped ledger adapters, chosen at runtime.
pub enum AnyLedger {
    Memory(MemoryLedger),
    Libsql(LibsqlLedger),
}

impl AnyLedger {
    /// Open the backend named by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Config` if the configuration is invalid, or the
    /// backend's own error if it cannot be opened.
    pub async fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let ledger = match config.backend {
            LedgerBackend::Memory => Self::Memory(MemoryLedger::new()),
            LedgerBackend::Libsql => Self::Libsql(LibsqlLedger::open_local(&config.path).await?),
        };
        tracing::info!(backend = %config.backend.as_str(), "ledger: opened");
        Ok(ledger)
    }

    #[must_use]
    pub const fn backend(&self) -> LedgerBackend {
        match self {
            Self::Memory(_) => LedgerBackend::Memory,
            Self::Libsql(_) => LedgerBackend::Libsql,
        }
    }
}

impl LedgerStore for AnyLedger {
    async fn begin(&self) -> Result<TxHeader, LedgerError> {
        match self {
            Self::Memory(l) => l.begin().await,
            Self::Libsql(l) => l.begin().await,
        }
    }

    async fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        match self {
            Self::Memory(l) => l.get_state(key).await,
            Self::Libsql(l) => l.get_state(key).await,
        }
    }

    async fn put_state(
        &self,
        key: &str,
        value: Vec<u8>,
        expected: Option<u64>,
        tx: &TxHeader,
    ) -> Result<u64, LedgerError> {
        match self {
            Self::Memory(l) => l.put_state(key, value, expected, tx).await,
            Self::Libsql(l) => l.put_state(key, value, expected, tx).await,
        }
    }

    async fn delete_state(
        &self,
        key: &str,
        expected: u64,
        tx: &TxHeader,
    ) -> Result<(), LedgerError> {
        match self {
            Self::Memory(l) => l.delete_state(key, expected, tx).await,
            Self::Libsql(l) => l.delete_state(key, expected, tx).await,
        }
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, LedgerError> {
        match self {
            Self::Memory(l) => l.range_scan(start, end).await,
            Self::Libsql(l) => l.range_scan(start, end).await,
        }
    }

    async fn rich_query(&self, selector: &Selector) -> Result<Vec<StateEntry>, LedgerError> {
        match self {
            Self::Memory(l) => l.rich_query(selector).await,
            Self::Libsql(l) => l.rich_query(selector).await,
        }
    }

    async fn history(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError> {
        match self {
            Self::Memory(l) => l.history(key).await,
            Self::Libsql(l) => l.history(key).await,
        }
    }
}
