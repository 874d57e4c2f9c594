//! # permit-store
//!
//! The ledger the permit contract reads and writes through.
//!
//! `LedgerStore` is a versioned key-value store with range scans, equality
//! queries over JSON values, and an append-only per-key history. Writes carry
//! the version the caller observed; a store that has since moved on rejects
//! the write with `LedgerError::Conflict` instead of overwriting it.
//!
//! Two adapters ship with the crate:
//! - [`MemoryLedger`] keeps everything in process memory.
//! - [`LibsqlLedger`] persists world state and key history in libSQL
//!   (the `libsql` crate, v0.9.29).
//!
//! [`AnyLedger`] selects one of them from configuration.

pub mod any;
pub mod error;
pub mod helpers;
pub mod libsql_ledger;
pub mod memory;
mod migrations;
pub mod selector;

use chrono::{DateTime, Utc};
use permit_core::tx::TxHeader;

pub use any::AnyLedger;
pub use error::LedgerError;
pub use libsql_ledger::LibsqlLedger;
pub use memory::MemoryLedger;
pub use selector::Selector;

/// The current value of a key and the version that wrote it.
///
/// Versions start at 1 and increase by one per write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: u64,
}

/// A key and its current value, as returned by scans and queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// One entry of a key's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    /// Empty for delete markers.
    pub value: Vec<u8>,
}

/// Versioned key-value ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerStore {
    /// Open a transaction: allocate its id and its timestamp.
    ///
    /// Timestamps never go backwards, so a write made after another committed
    /// write carries a strictly later timestamp.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store cannot issue a transaction.
    async fn begin(&self) -> Result<TxHeader, LedgerError>;

    /// Read the current value of `key`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store cannot be read.
    async fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError>;

    /// Write `value` under `key` if the current version equals `expected`
    /// (`None` meaning the key must be absent). Appends to the key history.
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Conflict` if the version check fails; nothing is
    /// written in that case.
    async fn put_state(
        &self,
        key: &str,
        value: Vec<u8>,
        expected: Option<u64>,
        tx: &TxHeader,
    ) -> Result<u64, LedgerError>;

    /// Remove `key` if its current version equals `expected`, recording a
    /// delete marker in its history.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Conflict` if the key is absent or has moved on.
    async fn delete_state(&self, key: &str, expected: u64, tx: &TxHeader)
    -> Result<(), LedgerError>;

    /// All live keys in `[start, end)` in key order. An empty `end` means
    /// unbounded.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store cannot be read.
    async fn range_scan(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, LedgerError>;

    /// All live keys whose JSON value satisfies `selector`, in key order.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Query` for an invalid selector.
    async fn rich_query(&self, selector: &Selector) -> Result<Vec<StateEntry>, LedgerError>;

    /// Every write and delete of `key`, oldest first. Empty if the key was
    /// never written.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the store cannot be read.
    async fn history(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError>;
}

/// Compare the observed version against the expected one.
pub(crate) fn check_version(
    key: &str,
    expected: Option<u64>,
    actual: Option<u64>,
) -> Result<(), LedgerError> {
    if expected == actual {
        Ok(())
    } else {
        tracing::debug!(key, ?expected, ?actual, "ledger: version conflict");
        Err(LedgerError::Conflict {
            key: key.to_string(),
            expected,
            actual,
        })
    }
}
