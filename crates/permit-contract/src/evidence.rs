//! Append-only file evidence.

use permit_core::entities::{FileHash, PermitRecord};
use permit_core::events::ContractEvent;
use permit_core::identity::IdentityResolver;
use permit_store::LedgerStore;

use crate::contract::{PermitContract, authorize, resolve};
use crate::error::ContractError;

impl<L: LedgerStore> PermitContract<L> {
    /// Append a file reference to a permit's evidence list.
    ///
    /// The entry is stamped with the caller and the transaction time and
    /// added at the end. Duplicate filenames or digests are allowed.
    ///
    /// # Errors
    ///
    /// - `Validation` if `filename` or `digest` is blank
    /// - `NotFound` if no permit has `id`
    /// - `Identity` if the caller cannot be resolved
    /// - `Authorization` if the caller belongs to another organization
    /// - `ConcurrentModification` if the permit changed since it was read
    /// - `Storage` on ledger failure
    pub async fn append_evidence(
        &self,
        caller: &dyn IdentityResolver,
        id: &str,
        filename: &str,
        digest: &str,
    ) -> Result<PermitRecord, ContractError> {
        const OP: &str = "AppendEvidence";

        if filename.trim().is_empty() || digest.trim().is_empty() {
            return Err(ContractError::validation(
                OP,
                "Invalid document data: filename and digest are required",
            ));
        }

        let (mut record, version) = self.load(id).await?;
        let caller = resolve(OP, caller)?;
        authorize(&caller, &record)?;

        let tx = self.begin(OP).await?;
        let entry = FileHash {
            filename: filename.to_string(),
            digest: digest.to_string(),
            uploaded_by: caller.caller_id.clone(),
            uploaded_at: tx.timestamp,
        };
        record.evidence.push(entry.clone());
        record.stamp(&caller.caller_id, &tx);
        self.persist(&record, Some(version)).await?;

        tracing::info!(
            permit_id = id,
            filename,
            evidence_count = record.evidence.len(),
            tx_id = %tx.tx_id,
            "evidence appended"
        );
        self.emit(ContractEvent::evidence_appended(&record, &entry));
        Ok(record)
    }
}
