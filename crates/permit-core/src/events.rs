//! Contract events.
//!
//! Every successful mutation emits one `ContractEvent`. The `payload` shape
//! depends on `name`; the typed detail structs below define those shapes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{FileHash, PermitRecord};
use crate::enums::{EventName, PermitStatus};
use crate::errors::CoreError;

/// Detail for `EventName::PermitCreated`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PermitCreatedDetail {
    pub organization: String,
    pub status: PermitStatus,
}

/// Detail for `EventName::StatusUpdated`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusUpdatedDetail {
    pub from: PermitStatus,
    pub to: PermitStatus,
}

/// A notification that a permit changed, tied to the producing transaction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    pub name: EventName,
    pub permit_id: String,
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl ContractEvent {
    fn for_record(
        name: EventName,
        record: &PermitRecord,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name,
            permit_id: record.id.clone(),
            tx_id: record.last_tx_id.clone(),
            timestamp: record.updated_at,
            payload,
        }
    }

    /// # Errors
    ///
    /// Returns `CoreError::Codec` if the payload cannot be serialized.
    pub fn permit_created(record: &PermitRecord) -> Result<Self, CoreError> {
        let detail = PermitCreatedDetail {
            organization: record.organization.clone(),
            status: record.status,
        };
        Ok(Self::for_record(
            EventName::PermitCreated,
            record,
            serde_json::to_value(detail)?,
        ))
    }

    /// # Errors
    ///
    /// Returns `CoreError::Codec` if the payload cannot be serialized.
    pub fn status_updated(record: &PermitRecord, from: PermitStatus) -> Result<Self, CoreError> {
        let detail = StatusUpdatedDetail {
            from,
            to: record.status,
        };
        Ok(Self::for_record(
            EventName::StatusUpdated,
            record,
            serde_json::to_value(detail)?,
        ))
    }

    /// # Errors
    ///
    /// Returns `CoreError::Codec` if the payload cannot be serialized.
    pub fn evidence_appended(record: &PermitRecord, entry: &FileHash) -> Result<Self, CoreError> {
        Ok(Self::for_record(
            EventName::EvidenceAppended,
            record,
            serde_json::to_value(entry)?,
        ))
    }
}
