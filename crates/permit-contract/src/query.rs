//! Read-only queries over permits.
//!
//! Point lookups go through the world state, predicate queries through
//! `LedgerStore::rich_query`, and history through the key history. Result
//! order of list queries is whatever the ledger returns.

use permit_core::entities::{DocType, PermitRecord};
use permit_core::enums::PermitStatus;
use permit_core::history::HistoryEntry;
use permit_store::{LedgerStore, Selector, StateEntry};

use crate::contract::PermitContract;
use crate::error::ContractError;

fn permits() -> Selector {
    Selector::new().eq("docType", DocType::Permit.as_str())
}

/// Decode every query hit; a permit-shaped hit that does not decode is a
/// storage fault.
fn decode_all(entries: Vec<StateEntry>) -> Result<Vec<PermitRecord>, ContractError> {
    entries
        .into_iter()
        .map(|entry| {
            PermitRecord::decode(&entry.value).map_err(|e| {
                ContractError::storage(format!("decode permit '{}'", entry.key), e)
            })
        })
        .collect()
}

impl<L: LedgerStore> PermitContract<L> {
    /// # Errors
    ///
    /// Returns `NotFound` if no permit has `id`, or `Storage` if it cannot
    /// be read.
    pub async fn get_by_id(&self, id: &str) -> Result<PermitRecord, ContractError> {
        Ok(self.load(id).await?.0)
    }

    /// # Errors
    ///
    /// Returns `Storage` if the ledger cannot be read.
    pub async fn exists(&self, id: &str) -> Result<bool, ContractError> {
        Ok(self
            .ledger()
            .get_state(id)
            .await
            .map_err(|e| ContractError::storage(format!("read permit '{id}'"), e))?
            .is_some())
    }

    /// All permits whose status is `status`, given as its upper-case literal.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown literal (the store is not
    /// touched), or `Storage` on ledger failure.
    pub async fn list_by_status(&self, status: &str) -> Result<Vec<PermitRecord>, ContractError> {
        let status: PermitStatus = status
            .parse()
            .map_err(|e| ContractError::from_input("ListByStatus", e))?;
        self.query(&permits().eq("status", status.as_str())).await
    }

    /// All permits owned by `organization`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on ledger failure.
    pub async fn list_by_organization(
        &self,
        organization: &str,
    ) -> Result<Vec<PermitRecord>, ContractError> {
        self.query(&permits().eq("organization", organization)).await
    }

    /// Every permit in the key space, in key order. Values that are not
    /// permits are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on ledger failure.
    pub async fn list_all(&self) -> Result<Vec<PermitRecord>, ContractError> {
        let entries = self
            .ledger()
            .range_scan("", "")
            .await
            .map_err(|e| ContractError::storage("scan permits", e))?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| match PermitRecord::decode(&entry.value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(key = %entry.key, error = %e, "list_all: skipping non-permit value");
                    None
                }
            })
            .collect())
    }

    /// Every past version of a permit, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the history cannot be read. An unknown id yields
    /// an empty list.
    pub async fn get_history(&self, id: &str) -> Result<Vec<PermitRecord>, ContractError> {
        Ok(self
            .get_history_entries(id)
            .await?
            .into_iter()
            .map(|entry| entry.record)
            .collect())
    }

    /// Every past version of a permit with the transaction that wrote it,
    /// oldest first. Delete markers and versions that do not decode are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the history cannot be read.
    pub async fn get_history_entries(&self, id: &str) -> Result<Vec<HistoryEntry>, ContractError> {
        let modifications = self
            .ledger()
            .history(id)
            .await
            .map_err(|e| ContractError::storage(format!("read history of '{id}'"), e))?;

        let mut entries = Vec::with_capacity(modifications.len());
        for modification in modifications {
            if modification.is_delete {
                tracing::warn!(permit_id = id, tx_id = %modification.tx_id, "history: skipping delete marker");
                continue;
            }
            match PermitRecord::decode(&modification.value) {
                Ok(record) => entries.push(HistoryEntry {
                    tx_id: modification.tx_id,
                    timestamp: modification.timestamp,
                    record,
                }),
                Err(e) => tracing::warn!(
                    permit_id = id,
                    tx_id = %modification.tx_id,
                    error = %e,
                    "history: skipping undecodable version"
                ),
            }
        }
        Ok(entries)
    }

    async fn query(&self, selector: &Selector) -> Result<Vec<PermitRecord>, ContractError> {
        let entries = self
            .ledger()
            .rich_query(selector)
            .await
            .map_err(|e| ContractError::storage("query permits", e))?;
        decode_all(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::test_support::helpers::{alice, test_contract};
    use permit_store::LedgerStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn exists_tracks_creation() {
        let contract = test_contract();
        assert!(!contract.exists("P-1").await.unwrap());
        contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
        assert!(contract.exists("P-1").await.unwrap());
    }

    #[tokio::test]
    async fn get_by_id_missing_is_not_found() {
        let contract = test_contract();
        let err = contract.get_by_id("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn history_of_unknown_id_is_empty() {
        let contract = test_contract();
        assert!(contract.get_history("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_all_skips_foreign_values() {
        let contract = test_contract();
        contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
        let tx = contract.ledger().begin().await.unwrap();
        contract
            .ledger()
            .put_state("config~rate", b"{\"docType\":\"setting\"}".to_vec(), None, &tx)
            .await
            .unwrap();

        let all = contract.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "P-1");
    }

    #[tokio::test]
    async fn history_skips_delete_markers() {
        let contract = test_contract();
        contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
        let tx = contract.ledger().begin().await.unwrap();
        contract.ledger().delete_state("P-1", 1, &tx).await.unwrap();

        let entries = contract.get_history_entries("P-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.id, "P-1");
    }
}
