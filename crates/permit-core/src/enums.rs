//! Status and event enums for the permit ledger.
//!
//! Permit statuses serialize as their upper-case ledger literal
//! (`"UNDER_REVIEW"`). `PermitStatus::allowed_next_states()` is the single
//! source of truth for the lifecycle graph.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// PermitStatus
// ---------------------------------------------------------------------------

/// Status of a permit application.
///
/// ```text
/// SUBMITTED    → UNDER_REVIEW | REJECTED
/// UNDER_REVIEW → APPROVED | REJECTED
/// APPROVED     → EXPIRED
/// REJECTED     → SUBMITTED (re-application)
/// EXPIRED      → SUBMITTED (re-application)
/// ```
///
/// No state is a dead end: rejected and expired permits re-enter `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Expired,
}

impl PermitStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Submitted,
        Self::UnderReview,
        Self::Approved,
        Self::Rejected,
        Self::Expired,
    ];

    /// Status assigned to every newly created permit.
    pub const INITIAL: Self = Self::Submitted;

    /// Valid next states from the current state.
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::UnderReview, Self::Rejected],
            Self::UnderReview => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Expired],
            Self::Rejected => &[Self::Submitted],
            Self::Expired => &[Self::Submitted],
        }
    }

    /// Check whether transitioning to `next` is allowed. Self-loops never are.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Return the literal stored on the ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermitStatus {
    type Err = CoreError;

    /// Parse an exact ledger literal. Matching is case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unrecognized permit status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// EventName
// ---------------------------------------------------------------------------

/// Name of a contract event emitted after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum EventName {
    PermitCreated,
    StatusUpdated,
    EvidenceAppended,
}

impl EventName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermitCreated => "PermitCreated",
            Self::StatusUpdated => "StatusUpdated",
            Self::EvidenceAppended => "EvidenceAppended",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
