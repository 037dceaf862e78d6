//! Syntax validation of the regenerated Swift file
//!
//! The pipeline only sees the [`SyntaxValidator`] trait. The Swift toolchain
//! backed implementation lives here too, but nothing else depends on `swiftc`
//! being installed. Every tool invocation is bounded by a timeout; a tool
//! that overruns is killed and the text is rejected.

use std::ffi::OsStr;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Limit for each `swiftc` or `swiftformat` run
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Validator output explaining why a text was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub message: String,
}

impl Diagnostics {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks (and possibly reformats) a candidate file text
pub trait SyntaxValidator {
    /// Returns the text to write, which may differ from the input if the
    /// validator also formats
    fn validate(&self, text: &str) -> Result<String, Diagnostics>;
}

/// Accepts everything unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughValidator;

impl SyntaxValidator for PassthroughValidator {
    fn validate(&self, text: &str) -> Result<String, Diagnostics> {
        Ok(text.to_string())
    }
}

/// `swiftc -parse`, plus `swiftformat` when it is on the PATH
#[derive(Debug, Clone)]
pub struct SwiftcValidator {
    swiftc: PathBuf,
    swiftformat: Option<PathBuf>,
    /// Directory for the scratch file (system temp dir when unset)
    work_dir: Option<PathBuf>,
    timeout: Duration,
}

impl SwiftcValidator {
    /// Find the toolchain on the PATH. `None` when `swiftc` is missing.
    pub fn discover() -> Option<Self> {
        let swiftc = which::which("swiftc").ok()?;
        let swiftformat = which::which("swiftformat").ok();
        tracing::debug!(
            "Using {} for validation (swiftformat: {})",
            swiftc.display(),
            swiftformat
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "not found".to_string())
        );
        Some(Self {
            swiftc,
            swiftformat,
            work_dir: None,
            timeout: DEFAULT_VALIDATION_TIMEOUT,
        })
    }

    /// Write scratch files next to the target instead of the temp dir
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_check(&self, path: &Path) -> Result<(), Diagnostics> {
        let output = run_with_timeout(
            &self.swiftc,
            &[OsStr::new("-parse"), path.as_os_str()],
            self.timeout,
        )?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Diagnostics::new(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    /// Format in place; false when the formatter is absent or fails
    fn format(&self, path: &Path) -> bool {
        let Some(swiftformat) = &self.swiftformat else {
            return false;
        };
        let args = [OsStr::new("--quiet"), path.as_os_str()];
        match run_with_timeout(swiftformat, &args, self.timeout) {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                tracing::warn!(
                    "swiftformat failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }
}

/// Run a tool to completion, killing it once `timeout` has passed
fn run_with_timeout(program: &Path, args: &[&OsStr], timeout: Duration) -> Result<Output, Diagnostics> {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Diagnostics::new(format!("Failed to start {}: {}", name, e)))?;

    runtime.block_on(async {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Diagnostics::new(format!("Failed to run {}: {}", name, e)))?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| Diagnostics::new(format!("Failed to run {}: {}", name, e))),
            Err(_) => {
                tracing::warn!("{} timed out after {:?}; killed", name, timeout);
                Err(Diagnostics::new(format!(
                    "{} did not finish within {:?}",
                    name, timeout
                )))
            }
        }
    })
}

impl SyntaxValidator for SwiftcValidator {
    fn validate(&self, text: &str) -> Result<String, Diagnostics> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".meshcore_sync_").suffix(".swift");
        let scratch = match &self.work_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut scratch =
            scratch.map_err(|e| Diagnostics::new(format!("Failed to create scratch file: {}", e)))?;
        scratch
            .write_all(text.as_bytes())
            .and_then(|_| scratch.flush())
            .map_err(|e| Diagnostics::new(format!("Failed to write scratch file: {}", e)))?;

        self.parse_check(scratch.path())?;

        if !self.format(scratch.path()) {
            return Ok(text.to_string());
        }

        let formatted = std::fs::read_to_string(scratch.path())
            .map_err(|e| Diagnostics::new(format!("Failed to read formatted file: {}", e)))?;
        self.parse_check(scratch.path()).map_err(|d| {
            Diagnostics::new(format!("swiftformat introduced syntax errors: {}", d))
        })?;
        Ok(formatted)
    }
}
