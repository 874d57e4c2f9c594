//! # permit-contract
//!
//! The permit ledger contract: creation, status transitions, evidence
//! appends and queries over a [`permit_store::LedgerStore`], with contract
//! events appended to a JSONL log.
//!
//! ```no_run
//! use permit_contract::PermitContract;
//! use permit_core::identity::ClientId;
//! use permit_store::MemoryLedger;
//!
//! # async fn demo() -> Result<(), permit_contract::ContractError> {
//! let contract = PermitContract::new(MemoryLedger::new());
//! let alice = ClientId::new("alice@OrgA");
//! contract.create_permit(&alice, "P-1", "OrgA").await?;
//! contract.update_status(&alice, "P-1", "UNDER_REVIEW").await?;
//! contract
//!     .append_evidence(&alice, "P-1", "site-plan.pdf", "sha256:9f86d0")
//!     .await?;
//! assert_eq!(contract.get_history("P-1").await?.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod contract;
pub mod dispatch;
pub mod error;
pub mod events;
mod evidence;
pub mod lifecycle;
mod query;
mod test_support;

pub use contract::PermitContract;
pub use dispatch::ContractFunction;
pub use error::{ContractError, ErrorKind, StorageFailure};
pub use events::EventLog;
