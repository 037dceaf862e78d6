//! Operator decisions during a sync
//!
//! The pipeline asks an [`Approver`] instead of prompting directly, so runs
//! can be interactive (dialoguer), fully automatic, or scripted in tests.

use std::collections::VecDeque;

use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Select};

use crate::cli::OutputFormat;
use crate::error::{Result, SyncError};
use crate::report::SyncReport;
use crate::schema::ChangeAnalysis;

/// Answer to a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
    Skip,
}

impl Decision {
    pub fn is_approved(self) -> bool {
        self == Self::Approve
    }
}

/// Source of operator decisions
pub trait Approver {
    /// Go ahead with the change set as a whole
    fn approve_changes(&mut self, report: &SyncReport) -> Result<Decision>;

    /// Apply the additions of one group. `Skip` leaves the group unchanged,
    /// `Reject` abandons the whole apply.
    fn approve_group(&mut self, analysis: &ChangeAnalysis) -> Result<Decision>;

    /// Proceed although `total` additions exceed `limit`
    fn confirm_threshold(&mut self, total: usize, limit: usize) -> Result<Decision>;
}

/// Approves everything (`--auto-approve`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprover;

impl Approver for AutoApprover {
    fn approve_changes(&mut self, _report: &SyncReport) -> Result<Decision> {
        Ok(Decision::Approve)
    }

    fn approve_group(&mut self, _analysis: &ChangeAnalysis) -> Result<Decision> {
        Ok(Decision::Approve)
    }

    fn confirm_threshold(&mut self, _total: usize, _limit: usize) -> Result<Decision> {
        Ok(Decision::Approve)
    }
}

/// Prompts on the terminal.
///
/// Prompts always go to stderr. The change summary goes to stdout for text
/// output and to stderr when stdout carries JSON.
pub struct InteractiveApprover {
    theme: ColorfulTheme,
    term: Term,
}

impl Default for InteractiveApprover {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveApprover {
    pub fn new() -> Self {
        Self::for_format(OutputFormat::Text)
    }

    pub fn for_format(format: OutputFormat) -> Self {
        let term = match format {
            OutputFormat::Json => Term::stderr(),
            OutputFormat::Text => Term::stdout(),
        };
        Self {
            theme: ColorfulTheme::default(),
            term,
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<Decision> {
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| SyncError::Prompt {
                message: format!("Confirmation cancelled: {}", e),
            })?;
        Ok(if confirmed {
            Decision::Approve
        } else {
            Decision::Reject
        })
    }
}

impl Approver for InteractiveApprover {
    fn approve_changes(&mut self, report: &SyncReport) -> Result<Decision> {
        self.term.write_str(&report.render_text())?;
        self.term.write_line("")?;
        let prompt = format!("Proceed with {} new enum cases?", report.totals.additions);
        self.confirm(&prompt, false)
    }

    fn approve_group(&mut self, analysis: &ChangeAnalysis) -> Result<Decision> {
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "  {} {} ({} new)",
            style("▸").cyan(),
            style(analysis.target_group).bold(),
            analysis.additions.len()
        ))?;
        for case in &analysis.additions {
            self.term.write_line(&format!(
                "    {} {} = {} {}",
                style("+").green(),
                case.name,
                case.value,
                style(format!("({})", case.original_name)).dim()
            ))?;
        }

        let options = &["Apply", "Skip this enum", "Abort"];
        let selection = Select::with_theme(&self.theme)
            .with_prompt(format!("Update {}?", analysis.target_group))
            .items(options)
            .default(0)
            .interact()
            .map_err(|e| SyncError::Prompt {
                message: format!("Selection cancelled: {}", e),
            })?;

        Ok(match selection {
            0 => Decision::Approve,
            1 => Decision::Skip,
            _ => Decision::Reject,
        })
    }

    fn confirm_threshold(&mut self, total: usize, limit: usize) -> Result<Decision> {
        self.term.write_line(&format!(
            "  {} {} additions exceed the safety limit of {}",
            style("!").yellow().bold(),
            total,
            limit
        ))?;
        self.confirm("Continue anyway?", false)
    }
}

/// Replays a fixed list of answers, then falls back to a default.
///
/// Used for headless runs and tests. Every question consumes one answer
/// from the front of the queue.
#[derive(Debug, Clone)]
pub struct ScriptedApprover {
    answers: VecDeque<Decision>,
    fallback: Decision,
    /// Number of questions asked so far
    pub asked: usize,
}

impl ScriptedApprover {
    pub fn new(answers: impl IntoIterator<Item = Decision>, fallback: Decision) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback,
            asked: 0,
        }
    }

    fn next(&mut self) -> Decision {
        self.asked += 1;
        self.answers.pop_front().unwrap_or(self.fallback)
    }
}

impl Approver for ScriptedApprover {
    fn approve_changes(&mut self, _report: &SyncReport) -> Result<Decision> {
        Ok(self.next())
    }

    fn approve_group(&mut self, _analysis: &ChangeAnalysis) -> Result<Decision> {
        Ok(self.next())
    }

    fn confirm_threshold(&mut self, _total: usize, _limit: usize) -> Result<Decision> {
        Ok(self.next())
    }
}
