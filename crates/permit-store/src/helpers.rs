//! Column conversion helpers for the libSQL ledger.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings in UTC with
//! nanosecond precision so that lexical order equals time order.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::LedgerError;

/// Format a timestamp for storage.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00.000000000Z"`) and `SQLite`'s
/// default format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `LedgerError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, LedgerError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| LedgerError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Convert a key version to its INTEGER column value.
///
/// # Errors
///
/// Returns `LedgerError::InvalidState` if the version exceeds `i64::MAX`.
pub fn version_to_sql(version: u64) -> Result<i64, LedgerError> {
    i64::try_from(version)
        .map_err(|_| LedgerError::InvalidState(format!("version {version} out of range")))
}

/// Read a key version from its INTEGER column value.
///
/// # Errors
///
/// Returns `LedgerError::InvalidState` for negative versions.
pub fn version_from_sql(raw: i64) -> Result<u64, LedgerError> {
    u64::try_from(raw).map_err(|_| LedgerError::InvalidState(format!("negative version {raw}")))
}
