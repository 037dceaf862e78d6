//! meshcore-sync configuration management.
//!
//! Settings are read from a TOML file, either given with `--config` or found at:
//! - Linux: ~/.config/meshcore-sync/config.toml
//! - macOS: ~/Library/Application Support/meshcore-sync/config.toml
//!
//! Every field has a default, so a missing file gives the stock behaviour.

use crate::error::SyncError;
use crate::schema::DEFAULT_PUSH_BOUNDARY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SyncConfig {
    /// Where releases are fetched from
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Which Python classes are considered
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Shape of the Swift declaration file
    #[serde(default)]
    pub target: TargetConfig,

    /// Guard rails for bulk changes
    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream release source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// GitHub `owner/name` of the Python library
    #[serde(default = "default_repo")]
    pub repo: String,

    /// GitHub REST API base
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Label used in the `// Synced to ...` marker
    #[serde(default = "default_library_label")]
    pub library_label: String,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_repo() -> String {
    "meshcore-dev/meshcore_py".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com/repos".to_string()
}

fn default_library_label() -> String {
    "MeshCore_py".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            api_base: default_api_base(),
            library_label: default_library_label(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Filters applied while recovering enums from Python source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Only these classes are kept. Empty keeps every accepted class.
    #[serde(default = "default_retained_enums")]
    pub retained_enums: Vec<String>,

    /// Sub-enums that are never part of the protocol surface
    #[serde(default = "default_skipped_enums")]
    pub skipped_enums: Vec<String>,

    /// Class name fragments marking handler/base classes
    #[serde(default = "default_skipped_name_tokens")]
    pub skipped_name_tokens: Vec<String>,

    /// Path fragment of the command sub-package
    #[serde(default = "default_skipped_path_token")]
    pub skipped_path_token: String,
}

fn default_retained_enums() -> Vec<String> {
    vec!["PacketType".to_string()]
}

fn default_skipped_enums() -> Vec<String> {
    vec!["BinaryReqType".to_string(), "ControlType".to_string()]
}

fn default_skipped_name_tokens() -> Vec<String> {
    vec![
        "command".to_string(),
        "handler".to_string(),
        "base".to_string(),
    ]
}

fn default_skipped_path_token() -> String {
    "commands".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            retained_enums: default_retained_enums(),
            skipped_enums: default_skipped_enums(),
            skipped_name_tokens: default_skipped_name_tokens(),
            skipped_path_token: default_skipped_path_token(),
        }
    }
}

/// Swift declaration file layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    /// Raw value type every group enum is declared with
    #[serde(default = "default_storage_type")]
    pub storage_type: String,

    /// Conformances written after the storage type when a block is created
    #[serde(default = "default_conformances")]
    pub conformances: Vec<String>,

    /// First value that belongs to the push group
    #[serde(default = "default_push_boundary")]
    pub push_boundary: i64,

    /// Case names with these prefixes are written in hex
    #[serde(default = "default_hex_prefixes")]
    pub hex_prefixes: Vec<String>,

    /// Append a new enum block when a group is missing instead of failing
    #[serde(default = "default_create_missing_blocks")]
    pub create_missing_blocks: bool,
}

fn default_storage_type() -> String {
    "UInt8".to_string()
}

fn default_conformances() -> Vec<String> {
    vec!["Sendable".to_string()]
}

fn default_push_boundary() -> i64 {
    DEFAULT_PUSH_BOUNDARY
}

fn default_hex_prefixes() -> Vec<String> {
    ["node", "path", "send", "set", "get", "req", "resp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_create_missing_blocks() -> bool {
    true
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            storage_type: default_storage_type(),
            conformances: default_conformances(),
            push_boundary: default_push_boundary(),
            hex_prefixes: default_hex_prefixes(),
            create_missing_blocks: default_create_missing_blocks(),
        }
    }
}

/// Safety limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyConfig {
    /// Total additions above which the operator must confirm
    #[serde(default = "default_max_additions")]
    pub max_additions: usize,

    /// Seconds each swiftc or swiftformat run may take before it is killed
    #[serde(default = "default_validation_timeout_secs")]
    pub validation_timeout_secs: u64,
}

fn default_max_additions() -> usize {
    50
}

fn default_validation_timeout_secs() -> u64 {
    30
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_additions: default_max_additions(),
            validation_timeout_secs: default_validation_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SyncConfig {
    /// Default config file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("meshcore-sync").join("config.toml"))
    }

    /// Load from an explicit path, or the default path when none is given.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SyncError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(SyncError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                Self::load_from(path)
            }
            None => match Self::default_path() {
                Some(path) => Self::load_from(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SyncError> {
        toml::from_str(content).map_err(|e| SyncError::Config {
            message: format!("Failed to parse config: {}", e),
        })
    }
}
