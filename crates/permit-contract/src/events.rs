//! JSONL contract event log.
//!
//! Appends `ContractEvent` records to `{dir}/events.jsonl`. Uses
//! `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use permit_config::EventsConfig;
use permit_core::events::ContractEvent;

const EVENTS_FILE: &str = "events.jsonl";

/// Appends contract events to a JSONL file.
///
/// Events are written after the ledger write has committed; the key history
/// stays authoritative if an append is lost.
pub struct EventLog {
    dir: PathBuf,
    enabled: bool,
}

impl EventLog {
    /// Create an enabled log in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be created.
    pub fn new(dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, enabled: true })
    }

    /// Create a log that drops every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    /// Build from the `[events]` configuration section.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`] when the log is enabled.
    pub fn from_config(config: &EventsConfig) -> std::io::Result<Self> {
        if config.enabled {
            Self::new(PathBuf::from(&config.dir))
        } else {
            Ok(Self::disabled())
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSONL file events are appended to.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Append one event. No-op when disabled.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file write fails.
    pub fn append(&self, event: &ContractEvent) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        serde_jsonlines::append_json_lines(self.path(), [event])
    }

    /// Read every event back in append order. Empty when disabled or when
    /// nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read or a line is not a
    /// valid event.
    pub fn read_all(&self) -> std::io::Result<Vec<ContractEvent>> {
        let path = self.path();
        if !self.enabled || !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines::<ContractEvent, _>(path)?.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use permit_core::entities::PermitRecord;
    use permit_core::tx::TxHeader;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn event(id: &str) -> ContractEvent {
        let tx = TxHeader {
            tx_id: "tx-0000000000000001".into(),
            timestamp: Utc::now(),
        };
        ContractEvent::permit_created(&PermitRecord::submitted(id, "OrgA", "alice@OrgA", &tx))
            .unwrap()
    }

    #[test]
    fn creates_directory_and_appends_lines() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("events");
        let log = EventLog::new(dir.clone()).unwrap();
        assert!(dir.is_dir());

        log.append(&event("P-1")).unwrap();
        log.append(&event("P-2")).unwrap();

        let events = log.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].permit_id, "P-1");
        assert_eq!(events[1].permit_id, "P-2");

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn disabled_log_is_a_noop() {
        let log = EventLog::disabled();
        assert!(!log.is_enabled());
        log.append(&event("P-1")).unwrap();
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let tmp = TempDir::new().unwrap();
        let config = EventsConfig {
            enabled: true,
            dir: tmp.path().join("ev").to_string_lossy().into_owned(),
        };
        assert!(EventLog::from_config(&config).unwrap().is_enabled());
        assert!(!EventLog::from_config(&EventsConfig::default()).unwrap().is_enabled());
    }
}
