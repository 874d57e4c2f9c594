//! Permit status transitions.
//!
//! The allowed edges are data (`PermitStatus::allowed_next_states`); this
//! module only checks a requested edge against them and writes the result.

use permit_core::entities::PermitRecord;
use permit_core::enums::PermitStatus;
use permit_core::events::ContractEvent;
use permit_core::identity::IdentityResolver;
use permit_store::LedgerStore;

use crate::contract::{PermitContract, authorize, resolve};
use crate::error::ContractError;

/// Check that `record` may move to `to`. Self-loops are rejected.
///
/// # Errors
///
/// Returns `ContractError::InvalidTransition` if `to` is not an allowed next
/// state of the record's current status.
pub fn check_transition(record: &PermitRecord, to: PermitStatus) -> Result<(), ContractError> {
    if record.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(ContractError::InvalidTransition {
            id: record.id.clone(),
            from: record.status,
            to,
        })
    }
}

impl<L: LedgerStore> PermitContract<L> {
    /// Move a permit to `new_status`, given as its upper-case literal.
    ///
    /// # Errors
    ///
    /// - `Validation` if `new_status` is not a known status (the store is
    ///   not touched)
    /// - `NotFound`, `Identity`, `Authorization`, `InvalidTransition`,
    ///   `ConcurrentModification` or `Storage` as for [`Self::transition`]
    pub async fn update_status(
        &self,
        caller: &dyn IdentityResolver,
        id: &str,
        new_status: &str,
    ) -> Result<PermitRecord, ContractError> {
        let to: PermitStatus = new_status
            .parse()
            .map_err(|e| ContractError::from_input("UpdateStatus", e))?;
        self.transition(caller, id, to).await
    }

    /// Move a permit to `to`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no permit has `id`
    /// - `Identity` if the caller cannot be resolved
    /// - `Authorization` if the caller belongs to another organization
    /// - `InvalidTransition` if `to` is not reachable in one step
    /// - `ConcurrentModification` if the permit changed since it was read
    /// - `Storage` on ledger failure
    pub async fn transition(
        &self,
        caller: &dyn IdentityResolver,
        id: &str,
        to: PermitStatus,
    ) -> Result<PermitRecord, ContractError> {
        const OP: &str = "UpdateStatus";

        let (mut record, version) = self.load(id).await?;
        let caller = resolve(OP, caller)?;
        authorize(&caller, &record)?;
        if let Err(e) = check_transition(&record, to) {
            tracing::debug!(permit_id = id, from = %record.status, to = %to, "transition rejected");
            return Err(e);
        }

        let from = record.status;
        let tx = self.begin(OP).await?;
        record.status = to;
        record.stamp(&caller.caller_id, &tx);
        self.persist(&record, Some(version)).await?;

        tracing::info!(permit_id = id, %from, %to, tx_id = %tx.tx_id, "permit status updated");
        self.emit(ContractEvent::status_updated(&record, from));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::helpers::{alice, mallory, test_contract};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn update_stamps_and_keeps_creation_fields() {
        let contract = test_contract();
        let created = contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();

        let bob = permit_core::identity::ClientId::new("bob@OrgA");
        let updated = contract
            .update_status(&bob, "P-1", "UNDER_REVIEW")
            .await
            .unwrap();

        assert_eq!(updated.status, PermitStatus::UnderReview);
        assert_eq!(updated.created_by, created.created_by);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_by, "bob@OrgA");
        assert!(updated.updated_at > created.updated_at);
        assert_ne!(updated.last_tx_id, created.last_tx_id);
    }

    #[tokio::test]
    async fn unknown_status_is_validation_even_for_missing_permit() {
        let contract = test_contract();
        let err = contract
            .update_status(&alice(), "missing", "BOGUS")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn not_found_precedes_authorization() {
        let contract = test_contract();
        let err = contract
            .update_status(&mallory(), "missing", "APPROVED")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn authorization_precedes_transition_check() {
        let contract = test_contract();
        contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
        let err = contract
            .update_status(&mallory(), "P-1", "EXPIRED")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn check_transition_rejects_self_loop() {
        let tx = permit_core::tx::TxHeader {
            tx_id: "tx-1".into(),
            timestamp: chrono::Utc::now(),
        };
        let record = PermitRecord::submitted("P-1", "OrgA", "alice@OrgA", &tx);
        assert!(check_transition(&record, PermitStatus::UnderReview).is_ok());
        assert!(matches!(
            check_transition(&record, PermitStatus::Submitted),
            Err(ContractError::InvalidTransition { from: PermitStatus::Submitted, to: PermitStatus::Submitted, .. })
        ));
    }
}
