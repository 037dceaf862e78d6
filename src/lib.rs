//! meshcore-enum-sync: keep Swift protocol enums in step with MeshCore Python
//!
//! The upstream MeshCore Python library defines the companion protocol's
//! packet codes as `IntEnum` classes. This crate downloads a release of that
//! library, recovers the enums with tree-sitter, routes each case into one of
//! the three Swift enums (`CommandCode`, `ResponseCode`, `PushCode`) and merges
//! the missing cases into `ProtocolFrame.swift`.
//!
//! Existing Swift cases are never renamed, renumbered or removed. New cases
//! are only added when neither their name nor their value is already taken.
//!
//! # Pipeline
//!
//! 1. [`release`] fetches and unpacks the upstream release
//! 2. [`extractor`] walks the Python tree into an [`EnumCatalog`]
//! 3. [`classify`] routes definitions into [`TargetGroup`]s
//! 4. [`target`] parses the Swift declaration file
//! 5. [`diff`] computes a [`ChangeAnalysis`] per group
//! 6. [`merge`] splices the additions back into the file text
//! 7. [`sync`] drives approval, validation, backup and the atomic write
//!
//! # Example
//!
//! ```ignore
//! use meshcore_enum_sync::approval::AutoApprover;
//! use meshcore_enum_sync::sync::{SyncOptions, SyncPipeline};
//! use meshcore_enum_sync::validate::PassthroughValidator;
//! use meshcore_enum_sync::SyncConfig;
//! use std::path::Path;
//!
//! let config = SyncConfig::default();
//! let mut approver = AutoApprover;
//! let mut pipeline = SyncPipeline::new(&config, &mut approver, &PassthroughValidator);
//! let mut options = SyncOptions::from_config(&config);
//! options.dry_run = false;
//! let run = pipeline.run(
//!     Path::new("meshcore_py-2.1.0"),
//!     "2.1.0",
//!     Path::new("ProtocolFrame.swift"),
//!     &options,
//! )?;
//! println!("{}", run.report.render_text());
//! ```

pub mod approval;
pub mod backup;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod extractor;
pub mod fs_utils;
pub mod merge;
pub mod naming;
pub mod release;
pub mod report;
pub mod schema;
pub mod sync;
pub mod target;
pub mod validate;

// Re-export commonly used types
pub use cli::{Cli, Commands, OutputFormat};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use schema::{
    ChangeAnalysis, DeclaredKind, EnumCase, EnumCatalog, EnumDefinition, ReleaseInfo,
    SourceLocation, TargetCase, TargetGroup,
};
pub use sync::{SyncOptions, SyncOutcome, SyncPipeline, SyncRun};
