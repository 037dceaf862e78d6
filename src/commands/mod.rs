//! Command modules for the meshcore-sync CLI
//!
//! Each command module implements a single top-level command:
//! - `sync` - Download a release and merge new enum cases into the Swift file
//! - `extract` - Show what a Python tree yields and where each enum is routed
//! - `inspect` - Show the enum blocks parsed from a Swift file
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext`, and return the text to print on stdout.

pub mod extract;
pub mod inspect;
pub mod sync;

pub use extract::run_extract;
pub use inspect::run_inspect;
pub use sync::run_sync;

use crate::cli::OutputFormat;
use crate::config::SyncConfig;
use crate::error::Result;

/// Shared context passed to all command handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    pub config: SyncConfig,
}

impl Default for CommandContext {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            verbose: false,
            config: SyncConfig::default(),
        }
    }
}

impl CommandContext {
    pub fn new(format: OutputFormat, verbose: bool, config: SyncConfig) -> Self {
        Self {
            format,
            verbose,
            config,
        }
    }
}

/// Pretty JSON with a trailing newline
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    out.push('\n');
    Ok(out)
}
