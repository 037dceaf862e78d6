//! Inspect command handler

use std::fs;

use serde::Serialize;

use crate::cli::{InspectArgs, OutputFormat};
use crate::commands::CommandContext;
use crate::error::{Result, SyncError};
use crate::schema::{TargetCase, TargetGroup};
use crate::target::{line_number, BlockLookup, BlockMatch, TargetDeclaration, TargetLayout};

#[derive(Serialize)]
struct BlockSummary<'a> {
    group: TargetGroup,
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_by: Option<BlockMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    cases: &'a [TargetCase],
}

/// Run the inspect command
pub fn run_inspect(args: &InspectArgs, ctx: &CommandContext) -> Result<String> {
    if !args.file.is_file() {
        return Err(SyncError::TargetNotFound {
            path: args.file.display().to_string(),
        });
    }

    let text = fs::read_to_string(&args.file)?;
    let layout = TargetLayout::new(ctx.config.target.storage_type.clone());
    let declaration = TargetDeclaration::parse(&text, &layout);

    let blocks: Vec<BlockSummary> = TargetGroup::ALL
        .iter()
        .map(|&group| match declaration.lookup(group) {
            BlockLookup::Found(block) => BlockSummary {
                group,
                found: true,
                matched_by: Some(block.span.matched_by),
                line: Some(line_number(&text, block.span.header.start)),
                cases: &block.cases,
            },
            BlockLookup::Missing => BlockSummary {
                group,
                found: false,
                matched_by: None,
                line: None,
                cases: &[],
            },
        })
        .collect();

    if ctx.format == OutputFormat::Json {
        return super::to_json(&serde_json::json!({
            "_type": "inspect",
            "file": args.file.display().to_string(),
            "marker": declaration.marker,
            "blocks": blocks,
        }));
    }

    let mut out = String::new();
    out.push_str("═══════════════════════════════════════════\n");
    out.push_str(&format!("  TARGET: {}\n", args.file.display()));
    out.push_str("═══════════════════════════════════════════\n\n");

    match &declaration.marker {
        Some(marker) => out.push_str(&format!(
            "synced_to: {} v{} on {}\n\n",
            marker.label, marker.version, marker.date
        )),
        None => out.push_str("synced_to: (never)\n\n"),
    }

    for block in &blocks {
        if !block.found {
            out.push_str(&format!("{}: missing\n\n", block.group));
            continue;
        }
        out.push_str(&format!(
            "{}: {} cases (line {}, {:?})\n",
            block.group,
            block.cases.len(),
            block.line.unwrap_or_default(),
            block.matched_by.unwrap_or(BlockMatch::LineScan)
        ));
        for case in block.cases {
            let position = case
                .position
                .map(|p| format!("L{}", p))
                .unwrap_or_default();
            out.push_str(&format!("  {:>6}  {} = {}", position, case.name, case.value));
            if let Some(comment) = &case.comment {
                out.push_str(&format!("  // {}", comment));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}
