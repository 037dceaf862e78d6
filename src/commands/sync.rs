//! Sync command handler - download, analyze and merge

use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::approval::{Approver, AutoApprover, InteractiveApprover};
use crate::cli::{OutputFormat, SyncArgs};
use crate::commands::CommandContext;
use crate::error::{Result, SyncError};
use crate::release::{version_from_dir, DownloadedRelease, ReleaseClient};
use crate::sync::{SyncOptions, SyncOutcome, SyncPipeline, SyncRun};
use crate::validate::{PassthroughValidator, SwiftcValidator, SyntaxValidator};

/// Run the sync command
pub fn run_sync(args: &SyncArgs, ctx: &CommandContext) -> Result<String> {
    args.validate()?;
    if !args.protocol_frame.is_file() {
        return Err(SyncError::TargetNotFound {
            path: args.protocol_frame.display().to_string(),
        });
    }

    let mut options = SyncOptions::from_config(&ctx.config);
    options.dry_run = args.is_dry_run();
    options.skip_backup = args.force;
    if let Some(limit) = args.max_additions {
        options.max_additions = limit;
    }

    let timeout = Duration::from_secs(ctx.config.safety.validation_timeout_secs);
    let validator = select_validator(args, &options, timeout)?;
    let mut approver: Box<dyn Approver> = if args.auto_approve {
        Box::new(AutoApprover)
    } else {
        Box::new(InteractiveApprover::for_format(ctx.format))
    };

    // Keeps the download directory alive until the run is over
    let mut _work_dir = None;
    let (source_dir, version) = match &args.source_dir {
        Some(dir) => {
            let version = args.source_version.clone().unwrap_or_else(|| {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                version_from_dir(&name, "")
            });
            (dir.clone(), version)
        }
        None => {
            let work = create_work_dir(args.temp_dir.as_deref())?;
            let release = download_release(args, ctx, work.path())?;
            _work_dir = Some(work);
            (release.source_dir, release.version)
        }
    };

    if ctx.verbose {
        eprintln!(
            "Syncing {} against {} v{}",
            args.protocol_frame.display(),
            ctx.config.upstream.library_label,
            version
        );
    }

    let mut pipeline = SyncPipeline::new(&ctx.config, approver.as_mut(), validator.as_ref());
    let run = pipeline.run(&source_dir, &version, &args.protocol_frame, &options)?;

    match ctx.format {
        OutputFormat::Json => super::to_json(&serde_json::json!({
            "_type": "sync",
            "report": run.report,
            "outcome": run.outcome,
        })),
        OutputFormat::Text => {
            // the interactive approver already printed the summary
            let summary_shown = !args.auto_approve
                && !options.dry_run
                && !matches!(run.outcome, SyncOutcome::InSync);
            Ok(render_text(&run, summary_shown))
        }
    }
}

fn select_validator(
    args: &SyncArgs,
    options: &SyncOptions,
    timeout: Duration,
) -> Result<Box<dyn SyntaxValidator>> {
    if args.skip_validation || options.dry_run {
        return Ok(Box::new(PassthroughValidator));
    }
    let validator = SwiftcValidator::discover().ok_or_else(|| SyncError::InvalidArguments {
        message: "swiftc not found on PATH; install the Swift toolchain or pass --skip-validation"
            .to_string(),
    })?;
    let dir = args
        .protocol_frame
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Box::new(validator.with_work_dir(dir).with_timeout(timeout)))
}

fn create_work_dir(parent: Option<&Path>) -> Result<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("meshcore_sync_");
    let dir = match parent {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            builder.tempdir_in(parent)?
        }
        None => builder.tempdir()?,
    };
    tracing::debug!("Working directory {}", dir.path().display());
    Ok(dir)
}

fn download_release(args: &SyncArgs, ctx: &CommandContext, work_dir: &Path) -> Result<DownloadedRelease> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| SyncError::Config {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;
    let client = ReleaseClient::new(&ctx.config.upstream)?;

    let spinner = (ctx.format == OutputFormat::Text).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        pb.set_message(match &args.baseline {
            Some(tag) => format!("Downloading {} {}...", ctx.config.upstream.repo, tag),
            None => format!("Downloading latest {}...", ctx.config.upstream.repo),
        });
        pb
    });

    let result = runtime.block_on(client.download(args.baseline.as_deref(), work_dir));

    if let Some(pb) = spinner {
        match &result {
            Ok(release) => pb.finish_with_message(format!(
                "{} Downloaded {} ({})",
                style("✓").green(),
                release.info.tag,
                release.version
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }
    result
}

fn render_text(run: &SyncRun, summary_shown: bool) -> String {
    let mut out = String::new();
    if !summary_shown {
        out.push_str(&run.report.render_text());
        out.push('\n');
    }

    match &run.outcome {
        SyncOutcome::InSync => {
            out.push_str(&format!("{} No changes detected - enums are already in sync\n", style("✓").green()));
        }
        SyncOutcome::DryRun => {
            out.push_str("Dry run complete - no changes made (use --apply to write)\n");
        }
        SyncOutcome::Declined => {
            out.push_str("No changes applied\n");
        }
        SyncOutcome::ThresholdAborted { total, limit } => {
            out.push_str(&format!(
                "{} Aborted: {} additions exceed the safety limit of {}\n",
                style("✗").red(),
                total,
                limit
            ));
        }
        SyncOutcome::Applied {
            backup,
            added,
            groups,
        } => {
            for (group, path) in groups {
                out.push_str(&format!("  {} {} ({:?})\n", style("✓").green(), group, path));
            }
            out.push_str(&format!(
                "{} Synchronization complete: {} cases added\n",
                style("✓").green(),
                added
            ));
            if let Some(backup) = backup {
                out.push_str(&format!("backup: {}\n", backup.display()));
            }
        }
    }
    out
}
