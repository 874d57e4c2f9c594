//! In-process ledger.
//!
//! All state lives behind one `std::sync::Mutex`; no lock is held across an
//! await point. Transaction ids are `tx-` followed by a 16-digit hex counter.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use permit_core::tx::TxHeader;

use crate::error::LedgerError;
use crate::selector::Selector;
use crate::{KeyModification, LedgerStore, StateEntry, VersionedValue, check_version};

#[derive(Debug, Default)]
struct Inner {
    next_tx: u64,
    last_timestamp: Option<DateTime<Utc>>,
    state: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<KeyModification>>,
}

impl Inner {
    fn version_of(&self, key: &str) -> Option<u64> {
        self.state.get(key).map(|v| v.version)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, LedgerError> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::InvalidState("memory ledger lock poisoned".into()))
    }
}

impl LedgerStore for MemoryLedger {
    async fn begin(&self) -> Result<TxHeader, LedgerError> {
        let mut inner = self.lock()?;
        inner.next_tx += 1;

        let now = Utc::now();
        let timestamp = match inner.last_timestamp {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        inner.last_timestamp = Some(timestamp);

        Ok(TxHeader {
            tx_id: format!("tx-{:016x}", inner.next_tx),
            timestamp,
        })
    }

    async fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        Ok(self.lock()?.state.get(key).cloned())
    }

    async fn put_state(
        &self,
        key: &str,
        value: Vec<u8>,
        expected: Option<u64>,
        tx: &TxHeader,
    ) -> Result<u64, LedgerError> {
        let mut inner = self.lock()?;
        let actual = inner.version_of(key);
        check_version(key, expected, actual)?;

        let version = actual.map_or(1, |v| v + 1);
        inner.history.entry(key.to_string()).or_default().push(KeyModification {
            tx_id: tx.tx_id.clone(),
            timestamp: tx.timestamp,
            is_delete: false,
            value: value.clone(),
        });
        inner
            .state
            .insert(key.to_string(), VersionedValue { value, version });
        Ok(version)
    }

    async fn delete_state(
        &self,
        key: &str,
        expected: u64,
        tx: &TxHeader,
    ) -> Result<(), LedgerError> {
        let mut inner = self.lock()?;
        check_version(key, Some(expected), inner.version_of(key))?;

        inner.state.remove(key);
        inner.history.entry(key.to_string()).or_default().push(KeyModification {
            tx_id: tx.tx_id.clone(),
            timestamp: tx.timestamp,
            is_delete: true,
            value: Vec::new(),
        });
        Ok(())
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, LedgerError> {
        let inner = self.lock()?;
        Ok(inner
            .state
            .range(start.to_string()..)
            .take_while(|(key, _)| end.is_empty() || key.as_str() < end)
            .map(|(key, v)| StateEntry {
                key: key.clone(),
                value: v.value.clone(),
            })
            .collect())
    }

    async fn rich_query(&self, selector: &Selector) -> Result<Vec<StateEntry>, LedgerError> {
        selector.validate()?;
        let inner = self.lock()?;
        Ok(inner
            .state
            .iter()
            .filter(|(_, v)| {
                serde_json::from_slice::<serde_json::Value>(&v.value)
                    .is_ok_and(|doc| selector.matches(&doc))
            })
            .map(|(key, v)| StateEntry {
                key: key.clone(),
                value: v.value.clone(),
            })
            .collect())
    }

    async fn history(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError> {
        Ok(self.lock()?.history.get(key).cloned().unwrap_or_default())
    }
}
