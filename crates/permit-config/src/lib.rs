//! # permit-config
//!
//! Layered configuration loading for the permit ledger using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PERMIT_*` prefix, `__` as separator)
//! 2. Project-level `.permit/config.toml`
//! 3. User-level `~/.config/permit-ledger/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PERMIT_LEDGER__BACKEND` -> `ledger.backend`,
//! `PERMIT_EVENTS__DIR` -> `events.dir`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use permit_config::{LedgerBackend, PermitConfig};
//!
//! let config = PermitConfig::load_with_dotenv().expect("config");
//! if config.ledger.backend == LedgerBackend::Libsql {
//!     println!("ledger file: {}", config.ledger.path);
//! }
//! ```

mod error;
mod events;
mod ledger;

pub use error::ConfigError;
pub use events::EventsConfig;
pub use ledger::{LedgerBackend, LedgerConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PermitConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl PermitConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed, or
    /// `ConfigError::InvalidValue` if the merged configuration is inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".permit/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("PERMIT_").split("__"))
    }

    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first inconsistent field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate()?;
        if self.events.enabled && self.events.dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "events.dir".into(),
                reason: "required when events.enabled = true".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("permit-ledger").join("config.toml"))
    }
}
