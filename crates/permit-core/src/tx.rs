//! Transaction header issued by the ledger.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity and clock of one ledger transaction.
///
/// The ledger, not the caller's wall clock, is authoritative for
/// `timestamp`. Every record version and evidence entry written by the
/// transaction carries these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TxHeader {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
}
