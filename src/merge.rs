//! Regeneration of a group's case list and splicing it back into the file
//!
//! The merged list is always existing cases plus additions, sorted by value
//! (stable, so equal values keep their file order), with a comma after every
//! line but the last. Three splice paths exist:
//!
//! - [`SplicePath::Structural`]: the block matched as one unit.
//! - [`SplicePath::LineScan`]: the block holds nested members and was found
//!   by counting braces.
//! - [`SplicePath::Created`]: the group had no block; a new one is appended.
//!
//! Both paths over an existing block splice the same way: each parsed case
//! line is a slot, the slots receive the rendered list in order, and the last
//! slot also takes any overflow. Every other line of the body (comments,
//! members, cases the line parser does not understand) is kept byte for byte.
//!
//! After splicing, the block is parsed again and must contain exactly the
//! merged list and the same non-case lines, whichever path was taken.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::Serialize;

use crate::config::TargetConfig;
use crate::error::{Result, SyncError};
use crate::schema::{EnumCase, TargetCase, TargetGroup};
use crate::target::{parse_block, parse_case_line, BlockMatch, TargetLayout};

static MARKER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^//\s*Synced to .*$").expect("marker line pattern is valid"));

/// When a value is written as hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRules {
    pub push_boundary: i64,
    /// Lower-case name prefixes of control-style codes
    pub hex_prefixes: Vec<String>,
}

impl FormatRules {
    pub fn from_config(config: &TargetConfig) -> Self {
        Self {
            push_boundary: config.push_boundary,
            hex_prefixes: config.hex_prefixes.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    fn wants_hex(&self, name: &str, value: i64) -> bool {
        if value < 0 {
            return false;
        }
        if value >= self.push_boundary {
            return true;
        }
        let lower = name.to_lowercase();
        value < 256 && self.hex_prefixes.iter().any(|p| lower.starts_with(p.as_str()))
    }
}

/// Everything a merge needs besides the text and the additions
#[derive(Debug, Clone)]
pub struct MergeSettings {
    pub layout: TargetLayout,
    pub rules: FormatRules,
    /// Conformances written after the storage type in a created block
    pub conformances: Vec<String>,
    pub create_missing_blocks: bool,
    /// Upstream version quoted in provenance comments
    pub version: String,
}

impl MergeSettings {
    pub fn from_config(config: &TargetConfig, version: impl Into<String>) -> Self {
        Self {
            layout: TargetLayout::new(config.storage_type.clone()),
            rules: FormatRules::from_config(config),
            conformances: config.conformances.clone(),
            create_missing_blocks: config.create_missing_blocks,
            version: version.into(),
        }
    }
}

/// Which splice path produced the new text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplicePath {
    Structural,
    LineScan,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    pub path: SplicePath,
    /// The block's cases after the merge, in rendered order
    pub cases: Vec<TargetCase>,
}

/// Swift literal for a value: `0x80` style hex or plain decimal
pub fn format_value(name: &str, value: i64, rules: &FormatRules) -> String {
    if rules.wants_hex(name, value) {
        format!("0x{:02X}", value)
    } else {
        value.to_string()
    }
}

/// Provenance comment written on inserted cases
pub fn addition_comment(case: &EnumCase, version: &str) -> String {
    format!(
        "Python: {} ({} v{})",
        case.original_name,
        case.file_name(),
        version
    )
}

/// Existing cases plus additions, stably sorted by value
pub fn merged_cases(existing: &[TargetCase], additions: &[EnumCase], version: &str) -> Vec<TargetCase> {
    let mut cases: Vec<TargetCase> = existing.to_vec();
    cases.extend(additions.iter().map(|case| TargetCase {
        name: case.name.clone(),
        value: case.value,
        comment: Some(addition_comment(case, version)),
        position: None,
    }));
    cases.sort_by_key(|c| c.value);
    cases
}

/// Render case lines, each ending in a newline
pub fn render_block_body(cases: &[TargetCase], indent: &str, rules: &FormatRules) -> String {
    let mut out = String::new();
    for (i, case) in cases.iter().enumerate() {
        let comma = if i + 1 < cases.len() { "," } else { "" };
        out.push_str(indent);
        out.push_str("case ");
        out.push_str(&case.name);
        out.push_str(" = ");
        out.push_str(&format_value(&case.name, case.value, rules));
        out.push_str(comma);
        if let Some(comment) = &case.comment {
            out.push_str(" // ");
            out.push_str(comment);
        }
        out.push('\n');
    }
    out
}

/// Merge `additions` into one group's block of `text`.
///
/// The block is located again in `text`, so groups can be merged one after
/// another on the output of the previous merge.
pub fn merge_group(
    text: &str,
    group: TargetGroup,
    additions: &[EnumCase],
    settings: &MergeSettings,
) -> Result<MergeOutcome> {
    let Some(span) = settings.layout.locate(text, group) else {
        if !settings.create_missing_blocks {
            return Err(SyncError::MissingBlock {
                group: group.to_string(),
            });
        }
        let cases = merged_cases(&[], additions, &settings.version);
        let text = append_block(text, group, &cases, settings);
        verify(&text, group, &cases, settings)?;
        tracing::info!("Created {} block with {} cases", group, cases.len());
        return Ok(MergeOutcome {
            text,
            path: SplicePath::Created,
            cases,
        });
    };

    let block = parse_block(text, group, span.clone());
    let cases = merged_cases(&block.cases, additions, &settings.version);
    let rendered = render_block_body(&cases, &block.indent, &settings.rules);

    let path = match span.matched_by {
        BlockMatch::Structural => SplicePath::Structural,
        BlockMatch::LineScan => SplicePath::LineScan,
    };
    let body = &text[span.body.clone()];
    let new_body = splice_case_lines(body, &rendered);

    let mut out = String::with_capacity(text.len() + rendered.len());
    out.push_str(&text[..span.body.start]);
    out.push_str(&new_body);
    out.push_str(&text[span.body.end..]);

    verify(&out, group, &cases, settings)?;
    verify_kept_lines(&out, group, body, settings)?;
    tracing::debug!("{} merged via {:?}: {} cases", group, path, cases.len());

    Ok(MergeOutcome {
        text: out,
        path,
        cases,
    })
}

/// Case lines of a block body; the line parser's view of what may be rewritten
fn is_case_slot(line: &str) -> bool {
    parse_case_line(line).is_some()
}

/// Old body with its case lines filled from the rendered list in order
fn splice_case_lines(body: &str, rendered: &str) -> String {
    let slots = body.split_inclusive('\n').filter(|l| is_case_slot(l)).count();
    let mut rendered_lines = rendered.split_inclusive('\n');
    let mut out = String::with_capacity(body.len() + rendered.len());
    let mut seen = 0;

    for line in body.split_inclusive('\n') {
        if !is_case_slot(line) {
            out.push_str(line);
            continue;
        }
        seen += 1;
        // a case sharing the header's line starts on a fresh one
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if seen == slots {
            rendered_lines.by_ref().for_each(|l| out.push_str(l));
        } else if let Some(l) = rendered_lines.next() {
            out.push_str(l);
        }
    }

    if slots > 0 {
        return out;
    }

    // No case lines yet: put the list just before the closing brace line
    match out.rfind('\n') {
        Some(i) => {
            let (head, tail) = out.split_at(i + 1);
            format!("{}{}{}", head, rendered, tail)
        }
        None => format!("{}\n{}", out, rendered),
    }
}

/// Non-blank lines of a body that are not case lines, trimmed at the end
fn kept_lines(body: &str) -> Vec<&str> {
    body.lines()
        .filter(|l| !l.trim().is_empty() && !is_case_slot(l))
        .map(str::trim_end)
        .collect()
}

fn append_block(text: &str, group: TargetGroup, cases: &[TargetCase], settings: &MergeSettings) -> String {
    let mut inherited = vec![settings.layout.storage_type.clone()];
    inherited.extend(settings.conformances.iter().cloned());

    let mut out = text.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!(
        "public enum {}: {} {{\n",
        group.declaration_name(),
        inherited.join(", ")
    ));
    out.push_str(&render_block_body(cases, "    ", &settings.rules));
    out.push_str("}\n");
    out
}

/// Parse the spliced block again and compare it with the intended list
fn verify(text: &str, group: TargetGroup, expected: &[TargetCase], settings: &MergeSettings) -> Result<()> {
    let span = settings.layout.locate(text, group).ok_or_else(|| SyncError::Splice {
        group: group.to_string(),
        message: "block not found after splicing".to_string(),
    })?;
    let found = parse_block(text, group, span).cases;

    let same = found.len() == expected.len()
        && found
            .iter()
            .zip(expected)
            .all(|(f, e)| f.name == e.name && f.value == e.value);
    if !same {
        return Err(SyncError::Splice {
            group: group.to_string(),
            message: format!(
                "expected {} cases after splicing, parsed {}",
                expected.len(),
                found.len()
            ),
        });
    }
    Ok(())
}

/// Every non-case line of the old body must still be in the new block
fn verify_kept_lines(text: &str, group: TargetGroup, old_body: &str, settings: &MergeSettings) -> Result<()> {
    let span = settings.layout.locate(text, group).ok_or_else(|| SyncError::Splice {
        group: group.to_string(),
        message: "block not found after splicing".to_string(),
    })?;
    let before = kept_lines(old_body);
    let after = kept_lines(&text[span.body]);
    if before != after {
        return Err(SyncError::Splice {
            group: group.to_string(),
            message: format!(
                "{} non-case lines before splicing, {} after",
                before.len(),
                after.len()
            ),
        });
    }
    Ok(())
}

/// Insert or replace the `// Synced to ...` line at the top of the file
pub fn apply_sync_marker(text: &str, label: &str, version: &str, date: &str) -> String {
    let marker = format!("// Synced to {} v{} on {}", label, version, date);
    if MARKER_LINE.is_match(text) {
        MARKER_LINE.replacen(text, 1, NoExpand(&marker)).into_owned()
    } else {
        format!("{}\n\n{}", marker, text)
    }
}
