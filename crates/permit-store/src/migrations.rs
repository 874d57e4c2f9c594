//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::LibsqlLedger;
use crate::error::LedgerError;

/// World state and key history tables with their indexes.
const MIGRATION_001: &str = include_str!("../migrations/001_ledger.sql");

impl LibsqlLedger {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), LedgerError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| LedgerError::Migration(format!("001_ledger: {e}")))?;
        Ok(())
    }
}
