//! Change summary shown before anything is written

use std::path::Path;

use console::style;
use serde::Serialize;

use crate::diff::ChangeTotals;
use crate::schema::{ChangeAnalysis, TargetGroup};
use crate::target::{SyncMarker, TargetDeclaration};

/// Duplicates listed inline per group before collapsing to "+N more"
const INLINE_DUPLICATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseEntry {
    pub name: String,
    pub value: i64,
    pub original_name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEntry {
    pub name: String,
    pub existing_name: String,
    pub existing_value: i64,
    pub upstream_value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub group: TargetGroup,
    /// Whether the group's block exists in the target file
    pub block_found: bool,
    pub covered: usize,
    pub additions: Vec<CaseEntry>,
    pub updates: Vec<UpdateEntry>,
    pub duplicates: Vec<CaseEntry>,
    pub target_only_extras: Vec<String>,
}

/// Serializable summary of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub target: String,
    pub upstream_version: String,
    pub previous_sync: Option<SyncMarker>,
    pub groups: Vec<GroupReport>,
    pub totals: ChangeTotals,
    /// Cases dropped because another definition already produced them
    pub cross_source_duplicates: usize,
}

impl SyncReport {
    pub fn build(
        target: &Path,
        upstream_version: &str,
        declaration: &TargetDeclaration,
        analyses: &[ChangeAnalysis],
        cross_source_duplicates: usize,
    ) -> Self {
        let groups = analyses
            .iter()
            .map(|a| GroupReport {
                group: a.target_group,
                block_found: !declaration.lookup(a.target_group).is_missing(),
                covered: a.covered.len(),
                additions: a.additions.iter().map(case_entry).collect(),
                updates: a
                    .updates
                    .iter()
                    .map(|(upstream, existing)| UpdateEntry {
                        name: upstream.name.clone(),
                        existing_name: existing.name.clone(),
                        existing_value: existing.value,
                        upstream_value: upstream.value,
                    })
                    .collect(),
                duplicates: a.duplicates.iter().map(case_entry).collect(),
                target_only_extras: a.target_only_extras.iter().map(|c| c.name.clone()).collect(),
            })
            .collect();

        Self {
            target: target.display().to_string(),
            upstream_version: upstream_version.to_string(),
            previous_sync: declaration.marker.clone(),
            groups,
            totals: ChangeTotals::of(analyses),
            cross_source_duplicates,
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.totals.additions == 0
    }

    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════\n");
        out.push_str("  ENUM SYNC SUMMARY\n");
        out.push_str("═══════════════════════════════════════════════════════\n\n");

        out.push_str(&format!("target: {}\n", self.target));
        out.push_str(&format!("upstream_version: {}\n", self.upstream_version));
        if let Some(marker) = &self.previous_sync {
            out.push_str(&format!(
                "previous_sync: {} v{} on {}\n",
                marker.label, marker.version, marker.date
            ));
        }
        out.push('\n');

        out.push_str(&format!(
            "  {:<14} {:>9} {:>8} {:>11} {:>7}\n",
            "enum", "additions", "updates", "duplicates", "extras"
        ));
        for group in &self.groups {
            let name = if group.block_found {
                group.group.to_string()
            } else {
                format!("{} (new)", group.group)
            };
            out.push_str(&format!(
                "  {:<14} {:>9} {:>8} {:>11} {:>7}\n",
                name,
                style(group.additions.len()).green(),
                style(group.updates.len()).yellow(),
                style(group.duplicates.len()).red(),
                group.target_only_extras.len()
            ));
            if !group.duplicates.is_empty() {
                let mut shown: Vec<String> = group
                    .duplicates
                    .iter()
                    .take(INLINE_DUPLICATES)
                    .map(|d| format!("{}={}", d.name, d.value))
                    .collect();
                if group.duplicates.len() > INLINE_DUPLICATES {
                    shown.push(format!("+{} more", group.duplicates.len() - INLINE_DUPLICATES));
                }
                out.push_str(&format!("  {:<14} ({})\n", "", shown.join(", ")));
            }
        }
        out.push_str(&format!(
            "  {:<14} {:>9} {:>8} {:>11}\n",
            style("total").bold(),
            style(self.totals.additions).green().bold(),
            style(self.totals.updates).yellow(),
            style(self.totals.duplicates).red()
        ));

        for group in self.groups.iter().filter(|g| !g.additions.is_empty()) {
            out.push_str(&format!("\n{}:\n", style(group.group).bold()));
            for case in &group.additions {
                out.push_str(&format!(
                    "  {} {} = {}  {}\n",
                    style("+").green(),
                    case.name,
                    case.value,
                    style(format!("// {} ({})", case.original_name, case.source)).dim()
                ));
            }
        }

        if self.totals.duplicates > 0 {
            out.push_str(&format!("\n{}\n", style("Duplicate value warnings:").red().bold()));
            for group in self.groups.iter().filter(|g| !g.duplicates.is_empty()) {
                out.push_str(&format!("  {}:\n", group.group));
                for dup in &group.duplicates {
                    out.push_str(&format!(
                        "    • {} (value {}) conflicts with an existing case\n",
                        dup.original_name, dup.value
                    ));
                }
            }
        }

        if self.totals.updates > 0 {
            out.push_str(&format!("\n{}\n", style("Value changes (not applied):").yellow().bold()));
            for group in &self.groups {
                for update in &group.updates {
                    out.push_str(&format!(
                        "  {}.{}: {} upstream, {} in target\n",
                        group.group, update.existing_name, update.upstream_value, update.existing_value
                    ));
                }
            }
        }

        out
    }
}

fn case_entry(case: &crate::schema::EnumCase) -> CaseEntry {
    CaseEntry {
        name: case.name.clone(),
        value: case.value,
        original_name: case.original_name.clone(),
        source: format!("{}:{}", case.location.file.display(), case.location.line),
    }
}
