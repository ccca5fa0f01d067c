//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use council_types::{Address, ChainId, ElectionSettings, PublicKey};
use council_utils::LogFormat;

use crate::NodeError;

/// A balance source backed by a history file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub address: Address,
    /// JSON object mapping accounts to `[since_unix_secs, balance]` entries.
    pub history_file: PathBuf,
}

/// Guardians trusted for one origin chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSetConfig {
    pub chain: u64,
    pub quorum: u8,
    pub guardians: Vec<PublicKey>,
}

/// This node's own guardian identity, used to sign its outbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianKeyConfig {
    pub index: u8,
    /// File holding a 32-byte Ed25519 seed as hex.
    pub seed_file: PathBuf,
}

/// Configuration for a council node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The chain this node governs; its local precinct.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Data directory for election storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Initial administrator, used by `initialize`.
    #[serde(default)]
    pub administrator: Option<Address>,

    /// Unix time the first epoch starts at; now when absent.
    #[serde(default)]
    pub initial_epoch_start: Option<u64>,

    #[serde(default)]
    pub settings: ElectionSettings,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub guardian_sets: Vec<GuardianSetConfig>,

    #[serde(default)]
    pub guardian_key: Option<GuardianKeyConfig>,

    /// How often `watch` polls the outbox.
    #[serde(default = "default_poll_interval")]
    pub outbox_poll_interval_secs: u64,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_id() -> u64 {
    1
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./council_data")
}

fn default_poll_interval() -> u64 {
    5
}

fn default_map_size() -> usize {
    council_store_lmdb::DEFAULT_MAP_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn chain(&self) -> ChainId {
        ChainId(self.chain_id)
    }

    /// Check everything that can be checked without opening storage.
    pub fn validate(&self) -> Result<(), NodeError> {
        if !self.settings.is_valid() {
            return Err(NodeError::Config("election settings are inconsistent".into()));
        }
        if self.outbox_poll_interval_secs == 0 {
            return Err(NodeError::Config("outbox_poll_interval_secs must be positive".into()));
        }
        for set in &self.guardian_sets {
            if set.chain == self.chain_id {
                return Err(NodeError::Config(format!(
                    "guardian set for the local chain {}",
                    set.chain
                )));
            }
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            data_dir: default_data_dir(),
            administrator: None,
            initial_epoch_start: None,
            settings: ElectionSettings::default(),
            providers: Vec::new(),
            guardian_sets: Vec::new(),
            guardian_key: None,
            outbox_poll_interval_secs: default_poll_interval(),
            lmdb_map_size: default_map_size(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
