//! CLI argument definitions using clap with subcommand architecture
//!
//! `sync` is the main workflow. `extract` and `inspect` run one side of the
//! pipeline offline, which helps when a sync reports something unexpected.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::error::{Result, SyncError};

/// Keep the Swift protocol enums in step with the MeshCore Python library
#[derive(Parser, Debug)]
#[command(name = "meshcore-sync")]
#[command(about = "Sync MeshCore Python enums into ProtocolFrame.swift")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to the user config dir)
    #[arg(long, value_name = "FILE", global = true, env = "MESHCORE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the upstream release and sync the Swift enums
    Sync(SyncArgs),

    /// Extract enum definitions from a local Python source tree
    Extract(ExtractArgs),

    /// Show the enum blocks parsed from a Swift file
    Inspect(InspectArgs),
}

// ============================================
// Sync Subcommand
// ============================================

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to ProtocolFrame.swift
    #[arg(
        long,
        value_name = "FILE",
        default_value = "PocketMeshKit/Protocol/ProtocolFrame.swift"
    )]
    pub protocol_frame: PathBuf,

    /// Preview changes without applying (the default without --apply)
    #[arg(long)]
    pub dry_run: bool,

    /// Apply changes (disables dry-run mode)
    #[arg(long)]
    pub apply: bool,

    /// Skip interactive approval prompts (requires --apply)
    #[arg(long)]
    pub auto_approve: bool,

    /// Compare against a specific release tag instead of the latest
    #[arg(long, value_name = "TAG")]
    pub baseline: Option<String>,

    /// Directory for downloads (a fresh temp dir otherwise)
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Skip backup creation (requires --apply)
    #[arg(long)]
    pub force: bool,

    /// Additions above this count need explicit confirmation
    #[arg(long, value_name = "N")]
    pub max_additions: Option<usize>,

    /// Use an already extracted source tree instead of downloading
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Version recorded for --source-dir (inferred from the directory name otherwise)
    #[arg(long, value_name = "VERSION", requires = "source_dir")]
    pub source_version: Option<String>,

    /// Write without running swiftc
    #[arg(long)]
    pub skip_validation: bool,
}

impl SyncArgs {
    /// Whether the run may write to the target file
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || !self.apply
    }

    /// Reject flag combinations that could never take effect
    pub fn validate(&self) -> Result<()> {
        if self.dry_run && self.apply {
            return Err(SyncError::InvalidArguments {
                message: "--dry-run and --apply cannot be used together".to_string(),
            });
        }
        if self.auto_approve && !self.apply {
            return Err(SyncError::InvalidArguments {
                message: "--auto-approve requires --apply (otherwise no changes would be made)"
                    .to_string(),
            });
        }
        if self.force && !self.apply {
            return Err(SyncError::InvalidArguments {
                message: "--force requires --apply (skipping backups only makes sense when applying changes)"
                    .to_string(),
            });
        }
        Ok(())
    }
}

// ============================================
// Extract Subcommand
// ============================================

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Root of the Python source tree
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Keep every accepted enum, not only the retained ones
    #[arg(long)]
    pub all: bool,
}

// ============================================
// Inspect Subcommand
// ============================================

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Swift declaration file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON for machine parsing
    Json,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
