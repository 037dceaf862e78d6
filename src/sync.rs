//! End-to-end synchronization of one target file against one source tree
//!
//! Nothing touches the target file until every group is merged in memory,
//! the safety gate has passed and the validator accepted the result. The
//! backup is taken right before the single write and restored if the write
//! fails.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::approval::{Approver, Decision};
use crate::backup::{create_backup, restore_backup};
use crate::classify::Classifier;
use crate::config::SyncConfig;
use crate::diff::analyze_all;
use crate::error::{Result, SyncError};
use crate::extractor::SourceExtractor;
use crate::fs_utils::write_atomic;
use crate::merge::{apply_sync_marker, merge_group, MergeSettings, SplicePath};
use crate::report::SyncReport;
use crate::schema::TargetGroup;
use crate::target::{TargetDeclaration, TargetLayout};
use crate::validate::SyntaxValidator;

/// Per-run switches
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Analyze and report only
    pub dry_run: bool,
    /// Write without taking a backup first
    pub skip_backup: bool,
    /// Additions above this need explicit confirmation
    pub max_additions: usize,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            dry_run: true,
            skip_backup: false,
            max_additions: config.safety.max_additions,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No additions were found
    InSync,
    /// Changes were found but not applied (`--dry-run`)
    DryRun,
    /// The operator turned the changes down
    Declined,
    /// The operator stopped at the safety limit
    ThresholdAborted { total: usize, limit: usize },
    Applied {
        backup: Option<PathBuf>,
        added: usize,
        groups: Vec<(TargetGroup, SplicePath)>,
    },
}

impl SyncOutcome {
    pub fn changed_file(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a run: what was found and what was done about it
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub report: SyncReport,
    pub outcome: SyncOutcome,
}

/// The extract, classify, diff, merge, validate and write pipeline
pub struct SyncPipeline<'a> {
    config: &'a SyncConfig,
    approver: &'a mut dyn Approver,
    validator: &'a dyn SyntaxValidator,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        config: &'a SyncConfig,
        approver: &'a mut dyn Approver,
        validator: &'a dyn SyntaxValidator,
    ) -> Self {
        Self {
            config,
            approver,
            validator,
        }
    }

    /// Run a full sync of `target` against the Python tree at `source_dir`
    pub fn run(
        &mut self,
        source_dir: &Path,
        version: &str,
        target: &Path,
        options: &SyncOptions,
    ) -> Result<SyncRun> {
        if !target.is_file() {
            return Err(SyncError::TargetNotFound {
                path: target.display().to_string(),
            });
        }

        let mut extractor = SourceExtractor::new(&self.config.extraction)?;
        let catalog = extractor.extract_all(source_dir)?;
        let boundary = self.config.target.push_boundary;
        let grouped = Classifier::new(boundary).classify(&catalog);
        for group in TargetGroup::ALL {
            tracing::debug!("{}: {} candidate cases", group, grouped.get(group).len());
        }

        let original = fs::read_to_string(target)?;
        let layout = TargetLayout::new(self.config.target.storage_type.clone());
        let declaration = TargetDeclaration::parse(&original, &layout);
        let analyses = analyze_all(&grouped, &declaration, boundary);
        let report = SyncReport::build(
            target,
            version,
            &declaration,
            &analyses,
            grouped.dropped_duplicates,
        );

        let done = |outcome| {
            Ok(SyncRun {
                report: report.clone(),
                outcome,
            })
        };

        if report.is_in_sync() {
            tracing::info!("No additions; {} is in sync", target.display());
            return done(SyncOutcome::InSync);
        }
        if options.dry_run {
            return done(SyncOutcome::DryRun);
        }

        if self.approver.approve_changes(&report)? != Decision::Approve {
            return done(SyncOutcome::Declined);
        }

        let settings = MergeSettings::from_config(&self.config.target, version);
        let mut text = original.clone();
        let mut added = 0;
        let mut groups = Vec::new();

        for analysis in analyses.iter().filter(|a| a.has_additions()) {
            match self.approver.approve_group(analysis)? {
                Decision::Approve => {}
                Decision::Skip => {
                    tracing::info!("Skipping {}", analysis.target_group);
                    continue;
                }
                Decision::Reject => return done(SyncOutcome::Declined),
            }

            let outcome = merge_group(&text, analysis.target_group, &analysis.additions, &settings)?;
            tracing::info!(
                "Added {} cases to {}",
                analysis.additions.len(),
                analysis.target_group
            );
            text = outcome.text;
            added += analysis.additions.len();
            groups.push((analysis.target_group, outcome.path));
        }

        if added == 0 {
            return done(SyncOutcome::Declined);
        }

        if added > options.max_additions {
            tracing::warn!(
                "{} additions exceed the safety limit of {}",
                added,
                options.max_additions
            );
            if self.approver.confirm_threshold(added, options.max_additions)? != Decision::Approve {
                return done(SyncOutcome::ThresholdAborted {
                    total: added,
                    limit: options.max_additions,
                });
            }
        }

        let validated = self
            .validator
            .validate(&text)
            .map_err(|d| SyncError::ValidationFailed {
                diagnostics: d.message,
            })?;

        let date = Local::now().format("%Y-%m-%d").to_string();
        let final_text = apply_sync_marker(
            &validated,
            &self.config.upstream.library_label,
            version,
            &date,
        );

        let backup = if options.skip_backup {
            tracing::warn!("Skipping backup of {}", target.display());
            None
        } else {
            Some(create_backup(target, &Local::now())?)
        };

        if let Err(e) = write_atomic(target, &final_text) {
            if let Some(backup) = &backup {
                restore_backup(backup, target)?;
            }
            return Err(e.into());
        }

        done(SyncOutcome::Applied {
            backup,
            added,
            groups,
        })
    }
}
