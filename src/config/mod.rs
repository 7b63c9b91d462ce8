//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `DECISION_LEDGER`
//! prefix with `__` (double underscore) separating nested values:
//!
//! - `DECISION_LEDGER__STORAGE__DATA_DIR=/var/lib/ledger`
//! - `DECISION_LEDGER__GOVERNANCE__REVIEW_TIMEOUT_SECS=15`

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Snapshot persistence configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Governance engine configuration.
    #[serde(default)]
    pub governance: GovernanceConfig,
}

/// Where and under what key the ledger snapshot persists.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for the file snapshot store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Stable key the full snapshot blob is stored under.
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_key: default_snapshot_key(),
        }
    }
}

/// Governance engine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    /// Organization all ledger entries are stamped with.
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Per-review timeout for the rich analyst before fallback.
    #[serde(default = "default_review_timeout")]
    pub review_timeout_secs: u64,

    /// Timeout for export attestation signing before exporting unsigned.
    #[serde(default = "default_signer_timeout")]
    pub signer_timeout_secs: u64,

    /// Auto-veto threshold applied when no matching policy supplies one.
    #[serde(default = "default_auto_veto_threshold")]
    pub auto_veto_threshold: u8,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            review_timeout_secs: default_review_timeout(),
            signer_timeout_secs: default_signer_timeout(),
            auto_veto_threshold: default_auto_veto_threshold(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_snapshot_key() -> String {
    "ledger".to_string()
}

fn default_organization() -> String {
    "default".to_string()
}

fn default_review_timeout() -> u64 {
    10
}

fn default_signer_timeout() -> u64 {
    5
}

fn default_auto_veto_threshold() -> u8 {
    85
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present (development), then reads variables
    /// with the `DECISION_LEDGER` prefix.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECISION_LEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Semantic validation of configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.snapshot_key.trim().is_empty() {
            return Err(ConfigError::invalid("storage.snapshot_key", "must not be empty"));
        }
        if self.governance.organization.trim().is_empty() {
            return Err(ConfigError::invalid("governance.organization", "must not be empty"));
        }
        if self.governance.review_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "governance.review_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.governance.signer_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "governance.signer_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.governance.auto_veto_threshold > 100 {
            return Err(ConfigError::invalid(
                "governance.auto_veto_threshold",
                "must be between 0 and 100",
            ));
        }
        Ok(())
    }
}
