//! The permit contract façade.
//!
//! `PermitContract` wraps a `LedgerStore` and an `EventLog`. Mutation methods
//! are implemented as `impl PermitContract` blocks across `lifecycle.rs`,
//! `evidence.rs` and this file; read methods live in `query.rs`.
//!
//! Every mutation follows this protocol:
//! 1. Validate inputs (no store access)
//! 2. Load the current record and its version
//! 3. Resolve the caller and authorize against the record's organization
//! 4. Compute the new record
//! 5. Open a ledger transaction and write with the observed version
//! 6. Append the contract event

use permit_config::PermitConfig;
use permit_core::entities::PermitRecord;
use permit_core::errors::CoreError;
use permit_core::events::ContractEvent;
use permit_core::identity::{CallerIdentity, IdentityResolver};
use permit_core::tx::TxHeader;
use permit_store::{AnyLedger, LedgerStore};

use crate::error::ContractError;
use crate::events::EventLog;

/// The permit ledger contract over a ledger `L`.
pub struct PermitContract<L: LedgerStore> {
    ledger: L,
    events: EventLog,
}

impl PermitContract<AnyLedger> {
    /// Open the configured ledger and event log.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::Storage` if the ledger cannot be opened or the
    /// event directory cannot be created.
    pub async fn from_config(config: &PermitConfig) -> Result<Self, ContractError> {
        let ledger = AnyLedger::open(&config.ledger)
            .await
            .map_err(|e| ContractError::storage("open ledger", e))?;
        let events = EventLog::from_config(&config.events)
            .map_err(|e| ContractError::storage("open event log", e))?;
        Ok(Self::with_event_log(ledger, events))
    }
}

impl<L: LedgerStore> PermitContract<L> {
    /// Contract with the event log disabled.
    #[must_use]
    pub const fn new(ledger: L) -> Self {
        Self::with_event_log(ledger, EventLog::disabled())
    }

    #[must_use]
    pub const fn with_event_log(ledger: L, events: EventLog) -> Self {
        Self { ledger, events }
    }

    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Register a new permit in `SUBMITTED` status.
    ///
    /// The caller's organization is not compared with `organization`.
    ///
    /// # Errors
    ///
    /// - `Validation` if `id` or `organization` is blank
    /// - `AlreadyExists` if a permit with `id` exists
    /// - `Identity` if the caller cannot be resolved
    /// - `ConcurrentModification` if a concurrent create of `id` won
    /// - `Storage` on ledger failure
    pub async fn create_permit(
        &self,
        caller: &dyn IdentityResolver,
        id: &str,
        organization: &str,
    ) -> Result<PermitRecord, ContractError> {
        const OP: &str = "CreatePermit";

        if id.trim().is_empty() || organization.trim().is_empty() {
            return Err(ContractError::validation(
                OP,
                "Invalid permit data: id and organization are required",
            ));
        }

        let existing = self
            .ledger
            .get_state(id)
            .await
            .map_err(|e| ContractError::storage(format!("read permit '{id}'"), e))?;
        if existing.is_some() {
            tracing::debug!(permit_id = id, "create rejected: already exists");
            return Err(ContractError::AlreadyExists { id: id.to_string() });
        }

        let caller = resolve(OP, caller)?;
        let tx = self.begin(OP).await?;
        let record = PermitRecord::submitted(id, organization, &caller.caller_id, &tx);
        self.persist(&record, None).await?;

        tracing::info!(
            permit_id = id,
            organization,
            tx_id = %tx.tx_id,
            caller = %caller.caller_id,
            "permit created"
        );
        self.emit(ContractEvent::permit_created(&record));
        Ok(record)
    }

    /// Load a permit and the version it was read at.
    pub(crate) async fn load(&self, id: &str) -> Result<(PermitRecord, u64), ContractError> {
        let versioned = self
            .ledger
            .get_state(id)
            .await
            .map_err(|e| ContractError::storage(format!("read permit '{id}'"), e))?
            .ok_or_else(|| ContractError::NotFound { id: id.to_string() })?;
        let record = PermitRecord::decode(&versioned.value)
            .map_err(|e| ContractError::storage(format!("decode permit '{id}'"), e))?;
        Ok((record, versioned.version))
    }

    pub(crate) async fn begin(
        &self,
        operation: &'static str,
    ) -> Result<TxHeader, ContractError> {
        self.ledger
            .begin()
            .await
            .map_err(|e| ContractError::storage(format!("{operation}: begin transaction"), e))
    }

    /// Write the whole record, expecting the ledger to still hold `expected`.
    pub(crate) async fn persist(
        &self,
        record: &PermitRecord,
        expected: Option<u64>,
    ) -> Result<u64, ContractError> {
        let bytes = record
            .encode()
            .map_err(|e| ContractError::storage(format!("encode permit '{}'", record.id), e))?;
        self.ledger
            .put_state(&record.id, bytes, expected, &tx_of(record))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    tracing::debug!(permit_id = %record.id, ?expected, "write lost a concurrent race");
                }
                ContractError::from_write(&record.id, e)
            })
    }

    /// Append a contract event. The ledger write has already committed, so a
    /// failure here is logged and not returned.
    pub(crate) fn emit(&self, event: Result<ContractEvent, CoreError>) {
        match event {
            Ok(event) => {
                if let Err(e) = self.events.append(&event) {
                    tracing::error!(
                        permit_id = %event.permit_id,
                        tx_id = %event.tx_id,
                        error = %e,
                        "event log append failed after commit"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "could not build contract event"),
        }
    }
}

/// Resolve and parse the caller for `operation`.
pub(crate) fn resolve(
    operation: &'static str,
    resolver: &dyn IdentityResolver,
) -> Result<CallerIdentity, ContractError> {
    CallerIdentity::resolve(resolver).map_err(|source| {
        tracing::debug!(operation, error = %source, "caller identity rejected");
        ContractError::Identity { operation, source }
    })
}

/// Mutations are scoped to the owning organization.
pub(crate) fn authorize(
    caller: &CallerIdentity,
    record: &PermitRecord,
) -> Result<(), ContractError> {
    if caller.is_member_of(&record.organization) {
        return Ok(());
    }
    tracing::debug!(
        permit_id = %record.id,
        caller = %caller.caller_id,
        owner = %record.organization,
        "mutation rejected: organization mismatch"
    );
    Err(ContractError::Authorization {
        id: record.id.clone(),
        caller: caller.caller_id.clone(),
        caller_org: caller.organization.clone(),
        owner: record.organization.clone(),
    })
}

/// The transaction header a stamped record was produced in.
fn tx_of(record: &PermitRecord) -> TxHeader {
    TxHeader {
        tx_id: record.last_tx_id.clone(),
        timestamp: record.updated_at,
    }
}
