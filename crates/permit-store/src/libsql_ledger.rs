//! libSQL-backed ledger.
//!
//! `world_state` holds the live value and version of every key;
//! `key_history` records every write and delete in commit order. A write
//! checks the version, updates `world_state` and appends to `key_history`
//! inside one SQL transaction.
//!
//! Writes open an `IMMEDIATE` transaction so the version check and the
//! write hold the database write lock together. File-backed ledgers run in
//! WAL mode with a busy timeout; a lock that is still held when the timeout
//! expires surfaces as a version conflict.
//!
//! Values are stored as BLOBs. Rich queries evaluate JSON functions over
//! `CAST(value AS TEXT)`, guarded by `json_valid` so that non-JSON values
//! simply never match.

use std::path::Path;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use libsql::{Builder, TransactionBehavior};
use permit_core::tx::TxHeader;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::helpers::{format_timestamp, parse_datetime, version_from_sql, version_to_sql};
use crate::selector::Selector;
use crate::{KeyModification, LedgerStore, StateEntry, VersionedValue, check_version};

const DOC: &str = "CAST(value AS TEXT)";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Primary result codes for `SQLITE_BUSY` and `SQLITE_LOCKED`.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

fn is_busy(err: &libsql::Error) -> bool {
    matches!(
        err,
        libsql::Error::SqliteFailure(code, _)
            if matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)
    )
}

/// Lock contention on a write means another writer got there first.
fn busy_as_conflict(key: &str, expected: Option<u64>, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::LibSql(ref inner) if is_busy(inner) => {
            tracing::debug!(key, ?expected, error = %inner, "ledger: write lock contention");
            LedgerError::Conflict {
                key: key.to_string(),
                expected,
                actual: None,
            }
        }
        other => other,
    }
}

/// Wrap a JSON expression so it yields NULL for non-JSON values.
fn guarded(expr: &str) -> String {
    format!("CASE WHEN json_valid({DOC}) THEN {expr} END")
}

/// Translate a selector into a WHERE clause and its positional parameters.
fn selector_sql(selector: &Selector) -> Result<(String, Vec<libsql::Value>), LedgerError> {
    let json_type = format!("json_type({DOC}, ?)");
    let json_extract = format!("json_extract({DOC}, ?)");

    let mut clauses = vec![format!("{} = 'object'", guarded(&format!("json_type({DOC})")))];
    let mut params: Vec<libsql::Value> = Vec::new();

    for (field, value) in selector.fields() {
        let path = format!("$.{field}");
        match value {
            Value::Null => {
                clauses.push(format!("{} = 'null'", guarded(&json_type)));
                params.push(path.into());
            }
            Value::Bool(b) => {
                clauses.push(format!("{} = '{b}'", guarded(&json_type)));
                params.push(path.into());
            }
            Value::String(s) => {
                clauses.push(format!("{} = 'text'", guarded(&json_type)));
                params.push(path.clone().into());
                clauses.push(format!("{} = ?", guarded(&json_extract)));
                params.push(path.into());
                params.push(s.clone().into());
            }
            Value::Number(n) => {
                clauses.push(format!("{} IN ('integer', 'real')", guarded(&json_type)));
                params.push(path.clone().into());
                clauses.push(format!("{} = ?", guarded(&json_extract)));
                params.push(path.into());
                let bound: libsql::Value = match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => i.into(),
                    (None, Some(f)) => f.into(),
                    (None, None) => {
                        return Err(LedgerError::Query(format!(
                            "selector value for '{field}' is not representable"
                        )));
                    }
                };
                params.push(bound);
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(LedgerError::Query(format!(
                    "selector value for '{field}' must be a scalar"
                )));
            }
        }
    }

    Ok((clauses.join(" AND "), params))
}

async fn collect_entries(mut rows: libsql::Rows) -> Result<Vec<StateEntry>, LedgerError> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(StateEntry {
            key: row.get(0)?,
            value: row.get(1)?,
        });
    }
    Ok(entries)
}

async fn current_version(
    conn: &libsql::Connection,
    key: &str,
) -> Result<Option<u64>, LedgerError> {
    let mut rows = conn
        .query("SELECT version FROM world_state WHERE key = ?1", [key])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(version_from_sql(row.get::<i64>(0)?)?)),
        None => Ok(None),
    }
}

/// Ledger persisted in a local libSQL database.
pub struct LibsqlLedger {
    #[allow(dead_code)]
    db: libsql::Database,
    pub(crate) conn: libsql::Connection,
    /// Serializes access to the shared connection so that a reader never
    /// observes a half-applied write.
    lock: Mutex<()>,
}

impl LibsqlLedger {
    /// Open a local database at `path` (or `":memory:"`), creating parent
    /// directories as needed.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the directory cannot be created, the database
    /// cannot be opened, or migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, LedgerError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        if path != ":memory:" {
            conn.execute_batch("PRAGMA journal_mode = WAL;").await?;
        }

        let ledger = Self {
            db,
            conn,
            lock: Mutex::new(()),
        };
        ledger.run_migrations().await?;
        tracing::debug!(path, "ledger: opened libsql ledger");
        Ok(ledger)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Open an `IMMEDIATE` transaction; the write lock is held until
    /// [`Self::finish`].
    async fn begin_write(&self) -> Result<libsql::Transaction, LedgerError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await?)
    }

    /// Commit on success, roll back on any error.
    async fn finish<T>(
        txn: libsql::Transaction,
        result: Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        match result {
            Ok(out) => {
                txn.commit().await?;
                Ok(out)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!(error = %rollback, "ledger: rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn apply_put(
        conn: &libsql::Connection,
        key: &str,
        value: Vec<u8>,
        expected: Option<u64>,
        tx: &TxHeader,
    ) -> Result<u64, LedgerError> {
        let actual = current_version(conn, key).await?;
        check_version(key, expected, actual)?;

        let version = actual.map_or(1, |v| v + 1);
        conn.execute(
            "INSERT INTO world_state (key, value, version, tx_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = excluded.version,
                tx_id = excluded.tx_id,
                updated_at = excluded.updated_at",
            libsql::params![
                key,
                value.clone(),
                version_to_sql(version)?,
                tx.tx_id.as_str(),
                format_timestamp(tx.timestamp)
            ],
        )
        .await?;
        Self::append_history(conn, key, tx, Some(value)).await?;
        Ok(version)
    }

    async fn apply_delete(
        conn: &libsql::Connection,
        key: &str,
        expected: u64,
        tx: &TxHeader,
    ) -> Result<(), LedgerError> {
        let actual = current_version(conn, key).await?;
        check_version(key, Some(expected), actual)?;

        conn.execute("DELETE FROM world_state WHERE key = ?1", [key])
            .await?;
        Self::append_history(conn, key, tx, None).await
    }

    async fn append_history(
        conn: &libsql::Connection,
        key: &str,
        tx: &TxHeader,
        value: Option<Vec<u8>>,
    ) -> Result<(), LedgerError> {
        let is_delete = i64::from(value.is_none());
        let value = value.map_or(libsql::Value::Null, Into::into);
        conn.execute(
            "INSERT INTO key_history (key, tx_id, timestamp, is_delete, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params![
                key,
                tx.tx_id.as_str(),
                format_timestamp(tx.timestamp),
                is_delete,
                value
            ],
        )
        .await?;
        Ok(())
    }
}

impl LedgerStore for LibsqlLedger {
    async fn begin(&self) -> Result<TxHeader, LedgerError> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT 'tx-' || lower(hex(randomblob(8))), (SELECT MAX(timestamp) FROM key_history)",
                (),
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| LedgerError::Query("begin returned no row".into()))?;

        let tx_id: String = row.get(0)?;
        let last = row
            .get::<Option<String>>(1)?
            .map(|s| parse_datetime(&s))
            .transpose()?;

        let now = Utc::now();
        let timestamp = match last {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        Ok(TxHeader { tx_id, timestamp })
    }

    async fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query("SELECT value, version FROM world_state WHERE key = ?1", [key])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(VersionedValue {
                value: row.get(0)?,
                version: version_from_sql(row.get::<i64>(1)?)?,
            })),
            None => Ok(None),
        }
    }

    async fn put_state(
        &self,
        key: &str,
        value: Vec<u8>,
        expected: Option<u64>,
        tx: &TxHeader,
    ) -> Result<u64, LedgerError> {
        let _guard = self.lock.lock().await;
        let outcome = async {
            let txn = self.begin_write().await?;
            let result = Self::apply_put(&txn, key, value, expected, tx).await;
            Self::finish(txn, result).await
        };
        outcome.await.map_err(|err| busy_as_conflict(key, expected, err))
    }

    async fn delete_state(
        &self,
        key: &str,
        expected: u64,
        tx: &TxHeader,
    ) -> Result<(), LedgerError> {
        let _guard = self.lock.lock().await;
        let outcome = async {
            let txn = self.begin_write().await?;
            let result = Self::apply_delete(&txn, key, expected, tx).await;
            Self::finish(txn, result).await
        };
        outcome
            .await
            .map_err(|err| busy_as_conflict(key, Some(expected), err))
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, LedgerError> {
        let _guard = self.lock.lock().await;
        let rows = self
            .conn
            .query(
                "SELECT key, value FROM world_state
                 WHERE key >= ?1 AND (?2 = '' OR key < ?2)
                 ORDER BY key",
                [start, end],
            )
            .await?;
        collect_entries(rows).await
    }

    async fn rich_query(&self, selector: &Selector) -> Result<Vec<StateEntry>, LedgerError> {
        selector.validate()?;
        let (clause, params) = selector_sql(selector)?;

        let _guard = self.lock.lock().await;
        let rows = self
            .conn
            .query(
                &format!("SELECT key, value FROM world_state WHERE {clause} ORDER BY key"),
                libsql::params_from_iter(params),
            )
            .await?;
        collect_entries(rows).await
    }

    async fn history(&self, key: &str) -> Result<Vec<KeyModification>, LedgerError> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT tx_id, timestamp, is_delete, value FROM key_history
                 WHERE key = ?1 ORDER BY seq",
                [key],
            )
            .await?;

        let mut modifications = Vec::new();
        while let Some(row) = rows.next().await? {
            modifications.push(KeyModification {
                tx_id: row.get(0)?,
                timestamp: parse_datetime(&row.get::<String>(1)?)?,
                is_delete: row.get::<i64>(2)? != 0,
                value: row.get::<Option<Vec<u8>>>(3)?.unwrap_or_default(),
            });
        }
        Ok(modifications)
    }
}
