//! Caller identity for contract invocations.
//!
//! The identity collaborator hands the contract an opaque caller id of the
//! form `<member>@<organization>`. `CallerIdentity` is the parsed form the
//! contract authorizes against. Contains only data and parsing, no PKI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::IdentityError;

/// Separator between the member and organization segments of a caller id.
pub const ORG_DELIMITER: char = '@';

/// Supplies the authenticated caller id for the current invocation.
pub trait IdentityResolver: Send + Sync {
    /// Return the raw caller id, e.g. `"alice@OrgA"`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unavailable` when no authenticated identity
    /// can be produced.
    fn resolve_caller(&self) -> Result<String, IdentityError>;
}

/// A resolver that always returns the same caller id.
///
/// Suitable for embedders that authenticate upstream and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    #[must_use]
    pub fn new(caller_id: impl Into<String>) -> Self {
        Self(caller_id.into())
    }
}

impl IdentityResolver for ClientId {
    fn resolve_caller(&self) -> Result<String, IdentityError> {
        Ok(self.0.clone())
    }
}

/// A resolver with no authenticated identity behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unauthenticated;

impl IdentityResolver for Unauthenticated {
    fn resolve_caller(&self) -> Result<String, IdentityError> {
        Err(IdentityError::Unavailable("no client identity attached".into()))
    }
}

/// Parsed caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CallerIdentity {
    /// Full caller id as resolved, recorded in `createdBy`/`updatedBy`.
    pub caller_id: String,
    pub member: String,
    pub organization: String,
}

impl CallerIdentity {
    /// Parse a raw caller id. The member is everything before the first
    /// delimiter and the organization is the segment that follows it; any
    /// further segments are ignored.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Malformed` if the delimiter is missing or
    /// either segment is empty.
    pub fn parse(caller_id: &str) -> Result<Self, IdentityError> {
        let malformed = |reason: &str| IdentityError::Malformed {
            caller_id: caller_id.to_string(),
            reason: reason.to_string(),
        };

        let (member, rest) = caller_id
            .split_once(ORG_DELIMITER)
            .ok_or_else(|| malformed("missing organization delimiter"))?;
        let organization = rest.split_once(ORG_DELIMITER).map_or(rest, |(org, _)| org);

        if member.trim().is_empty() {
            return Err(malformed("empty member segment"));
        }
        if organization.trim().is_empty() {
            return Err(malformed("empty organization segment"));
        }

        Ok(Self {
            caller_id: caller_id.to_string(),
            member: member.to_string(),
            organization: organization.to_string(),
        })
    }

    /// Resolve and parse the caller from a collaborator.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's `IdentityError`, or `Malformed` if the
    /// resolved id cannot be parsed.
    pub fn resolve(resolver: &dyn IdentityResolver) -> Result<Self, IdentityError> {
        Self::parse(&resolver.resolve_caller()?)
    }

    /// Whether this caller belongs to `organization`.
    #[must_use]
    pub fn is_member_of(&self, organization: &str) -> bool {
        self.organization == organization
    }
}
