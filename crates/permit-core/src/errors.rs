//! Cross-cutting error types for the permit ledger.
//!
//! Store errors (`LedgerError`) and the contract-level taxonomy
//! (`ContractError`) live in their own crates. The errors here can be raised
//! wherever core types are parsed or decoded.

use thiserror::Error;

/// Errors raised while validating or decoding core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (unknown literal, blank field).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored bytes could not be encoded or decoded as a permit record.
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors raised while resolving the calling identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The identity collaborator could not produce an authenticated caller.
    #[error("caller identity unavailable: {0}")]
    Unavailable(String),

    /// The caller id does not have the `<member>@<organization>` shape.
    #[error("malformed caller id '{caller_id}': {reason}")]
    Malformed { caller_id: String, reason: String },
}
