use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One write-once evidence entry attached to a permit.
///
/// Only the content digest is recorded; file bytes never touch the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileHash {
    pub filename: String,
    /// Content hash in whatever notation the uploader used (`sha256:...`).
    pub digest: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}
