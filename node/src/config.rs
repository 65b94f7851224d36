//! Token subsystem configuration with TOML file support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use itc_types::params::{CREATE_FEE_PER_VBYTE, DEFAULT_FEE_PER_VBYTE};
use itc_types::{Amount, TokenParams};

use crate::NodeError;

/// Configuration for the token subsystem.
///
/// Can be loaded from a TOML file via [`TokenNodeConfig::from_toml_file`]
/// or built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenNodeConfig {
    /// Data directory for the token database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Fee rate (base units per virtual byte) for non-create operations.
    #[serde(default = "default_fee_per_vbyte")]
    pub fee_per_vbyte: Amount,

    /// Fee rate for Create operations.
    #[serde(default = "default_create_fee_per_vbyte")]
    pub create_fee_per_vbyte: Amount,

    /// Lowest block height considered during rescan.
    #[serde(default)]
    pub token_activation_height: i64,

    /// Destination address for governance fee outputs.
    #[serde(default = "default_governance_wallet")]
    pub governance_wallet: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./itc_data/tokens")
}

fn default_fee_per_vbyte() -> Amount {
    DEFAULT_FEE_PER_VBYTE
}

fn default_create_fee_per_vbyte() -> Amount {
    CREATE_FEE_PER_VBYTE
}

fn default_governance_wallet() -> String {
    TokenParams::default().governance_wallet
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl TokenNodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("TokenNodeConfig is always serializable to TOML")
    }

    /// The ledger parameters this configuration describes.
    pub fn token_params(&self) -> TokenParams {
        TokenParams {
            fee_per_vbyte: self.fee_per_vbyte,
            create_fee_per_vbyte: self.create_fee_per_vbyte,
            activation_height: self.token_activation_height,
            governance_wallet: self.governance_wallet.clone(),
            ..TokenParams::default()
        }
    }
}

impl Default for TokenNodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            fee_per_vbyte: default_fee_per_vbyte(),
            create_fee_per_vbyte: default_create_fee_per_vbyte(),
            token_activation_height: 0,
            governance_wallet: default_governance_wallet(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
