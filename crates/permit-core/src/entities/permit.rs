use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::FileHash;
use crate::enums::PermitStatus;
use crate::errors::CoreError;
use crate::tx::TxHeader;

/// Document discriminator stored with every record.
///
/// Predicate queries select on `docType` so that other values sharing the
/// key space are never mistaken for permits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    #[default]
    Permit,
}

impl DocType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permit => "permit",
        }
    }
}

/// A permit application and its evidence trail.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermitRecord {
    pub doc_type: DocType,
    pub id: String,
    pub organization: String,
    pub status: PermitStatus,
    pub evidence: Vec<FileHash>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_tx_id: String,
}

impl PermitRecord {
    /// Build the first version of a permit in the initial status.
    #[must_use]
    pub fn submitted(id: &str, organization: &str, created_by: &str, tx: &TxHeader) -> Self {
        Self {
            doc_type: DocType::Permit,
            id: id.to_string(),
            organization: organization.to_string(),
            status: PermitStatus::INITIAL,
            evidence: Vec::new(),
            created_by: created_by.to_string(),
            updated_by: created_by.to_string(),
            created_at: tx.timestamp,
            updated_at: tx.timestamp,
            last_tx_id: tx.tx_id.clone(),
        }
    }

    /// Record who changed the permit and in which transaction.
    pub fn stamp(&mut self, updated_by: &str, tx: &TxHeader) {
        self.updated_by = updated_by.to_string();
        self.updated_at = tx.timestamp;
        self.last_tx_id.clone_from(&tx.tx_id);
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Codec` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, CoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a stored value.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Codec` if the bytes are not a permit record.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
