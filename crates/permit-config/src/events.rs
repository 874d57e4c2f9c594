//! Contract event log configuration.

use serde::{Deserialize, Serialize};

fn default_dir() -> String {
    ".permit/events".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Whether contract events are appended to the JSONL event log.
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding `events.jsonl`.
    #[serde(default = "default_dir")]
    pub dir: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_dir(),
        }
    }
}
