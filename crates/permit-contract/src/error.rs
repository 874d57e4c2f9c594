//! Contract error taxonomy.
//!
//! Every failure a caller of `PermitContract` can observe is one of the
//! variants below. Lower layers (`LedgerError`, `CoreError`,
//! `IdentityError`) converge here with the permit id or operation attached.

use permit_core::enums::PermitStatus;
use permit_core::errors::{CoreError, IdentityError};
use permit_store::LedgerError;
use thiserror::Error;

/// What went wrong underneath a `ContractError::Storage`.
#[derive(Debug, Error)]
pub enum StorageFailure {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Stored bytes or a result value could not be (de)serialized.
    #[error(transparent)]
    Codec(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors returned by contract operations.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("permit '{id}' already exists")]
    AlreadyExists { id: String },

    #[error("permit '{id}' does not exist")]
    NotFound { id: String },

    #[error("permit '{id}': cannot transition from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: PermitStatus,
        to: PermitStatus,
    },

    #[error("{operation}: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    #[error(
        "caller '{caller}' ({caller_org}) may not modify permit '{id}' owned by {owner}"
    )]
    Authorization {
        id: String,
        caller: String,
        caller_org: String,
        owner: String,
    },

    #[error("{operation}: {source}")]
    Identity {
        operation: &'static str,
        #[source]
        source: IdentityError,
    },

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: StorageFailure,
    },

    #[error("permit '{id}' was modified concurrently; re-read and retry")]
    ConcurrentModification { id: String },
}

/// Discriminant of `ContractError` for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    InvalidTransition,
    Validation,
    Authorization,
    Identity,
    Storage,
    ConcurrentModification,
}

impl ContractError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::Identity { .. } => ErrorKind::Identity,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
        }
    }

    /// Only a lost optimistic-concurrency race is worth retrying, and only
    /// by the caller after re-reading.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    pub(crate) fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn storage(context: impl Into<String>, source: impl Into<StorageFailure>) -> Self {
        Self::Storage {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Map a ledger write failure for permit `id`.
    pub(crate) fn from_write(id: &str, err: LedgerError) -> Self {
        if err.is_conflict() {
            Self::ConcurrentModification { id: id.to_string() }
        } else {
            Self::storage(format!("write permit '{id}'"), err)
        }
    }

    /// Map a core parse failure raised while validating `operation` input.
    pub(crate) fn from_input(operation: &'static str, err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::validation(operation, message),
            codec @ CoreError::Codec(_) => Self::storage(operation, codec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict = ContractError::from_write(
            "P-1",
            LedgerError::Conflict {
                key: "P-1".into(),
                expected: Some(1),
                actual: Some(2),
            },
        );
        assert_eq!(conflict.kind(), ErrorKind::ConcurrentModification);
        assert!(conflict.is_retryable());

        let storage = ContractError::from_write("P-1", LedgerError::Query("disk full".into()));
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert!(!storage.is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err = ContractError::InvalidTransition {
            id: "P-1".into(),
            from: PermitStatus::Submitted,
            to: PermitStatus::Approved,
        };
        assert_eq!(
            err.to_string(),
            "permit 'P-1': cannot transition from SUBMITTED to APPROVED"
        );

        let err = ContractError::from_write("P-2", LedgerError::Query("boom".into()));
        assert_eq!(err.to_string(), "write permit 'P-2': Query failed: boom");
    }

    #[test]
    fn input_validation_keeps_message() {
        let err = ContractError::from_input(
            "UpdateStatus",
            CoreError::Validation("unknown permit status 'BOGUS'".into()),
        );
        assert!(matches!(
            err,
            ContractError::Validation { operation: "UpdateStatus", ref message } if message.contains("BOGUS")
        ));
    }
}
