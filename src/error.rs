//! Error types and exit codes for meshcore-sync

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for enum synchronization
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Target file not found: {path}")]
    TargetNotFound { path: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Release download failed: {message}")]
    Release { message: String },

    #[error("Archive extraction failed: {message}")]
    Archive { message: String },

    #[error("Failed to parse {path}: {message}")]
    ParseFailure { path: String, message: String },

    #[error("Enum block {group} not found in target file")]
    MissingBlock { group: String },

    #[error("Could not splice cases into {group}: {message}")]
    Splice { group: String, message: String },

    #[error("Generated file failed validation:\n{diagnostics}")]
    ValidationFailed { diagnostics: String },

    #[error("Failed to restore backup {}: {message}", backup.display())]
    RestoreFailed { backup: PathBuf, message: String },

    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Convert error to the process exit code.
    ///
    /// Every fatal condition exits with 1; success, no-op and operator
    /// aborts never reach this path.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::TargetNotFound { .. }
            | Self::InvalidArguments { .. }
            | Self::Config { .. }
            | Self::Release { .. }
            | Self::Archive { .. }
            | Self::ParseFailure { .. }
            | Self::MissingBlock { .. }
            | Self::Splice { .. }
            | Self::ValidationFailed { .. }
            | Self::RestoreFailed { .. }
            | Self::Prompt { .. }
            | Self::Io(_) => ExitCode::from(1),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        Self::Release {
            message: e.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for SyncError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive {
            message: e.to_string(),
        }
    }
}

/// Result type alias for meshcore-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
