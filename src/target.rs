//! Parser for the Swift declaration file holding the protocol enums
//!
//! Each target group is a block of the form
//!
//! ```text
//! public enum ResponseCode: UInt8, Sendable {
//!     case ok = 0,
//!     case err = 1 // generic failure
//! }
//! ```
//!
//! Blocks are located by their header signature (group name plus storage
//! type). A block whose body has no nested braces is matched as a single unit;
//! otherwise it is found by scanning lines and counting braces. A group that
//! cannot be found is reported as [`BlockLookup::Missing`], never as an error.

use std::collections::BTreeMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::schema::{TargetCase, TargetGroup};

static CASE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*case\s+(\w+)\s*=\s*(-?(?:0[xX][0-9A-Fa-f_]+|[0-9][0-9_]*))\s*,?\s*(?://\s*(.*?))?\s*$",
    )
    .expect("case line pattern is valid")
});

static SYNC_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^//\s*Synced to (\S+) v(\S+) on (\S+)\s*$").expect("marker pattern is valid")
});

/// How a block was located in the file text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMatch {
    /// Header and brace-free body matched as one unit
    Structural,
    /// Found by scanning lines and counting nested braces
    LineScan,
}

/// Byte ranges of one enum block in the file text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Header text, from the start of its line through the opening `{`
    pub header: Range<usize>,
    /// Everything between the opening and the closing brace
    pub body: Range<usize>,
    /// Whole block, through the closing `}`
    pub block: Range<usize>,
    pub matched_by: BlockMatch,
}

/// A parsed enum block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock {
    pub group: TargetGroup,
    pub span: BlockSpan,
    pub cases: Vec<TargetCase>,
    /// Indentation of the case lines (four spaces when there are none)
    pub indent: String,
}

/// Result of looking up one group in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLookup {
    Found(GroupBlock),
    Missing,
}

impl BlockLookup {
    pub fn cases(&self) -> &[TargetCase] {
        match self {
            Self::Found(block) => &block.cases,
            Self::Missing => &[],
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// `// Synced to <label> v<version> on <date>` line at the top of the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncMarker {
    pub label: String,
    pub version: String,
    pub date: String,
}

/// Header signature of the group blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    pub storage_type: String,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            storage_type: "UInt8".to_string(),
        }
    }
}

impl TargetLayout {
    pub fn new(storage_type: impl Into<String>) -> Self {
        Self {
            storage_type: storage_type.into(),
        }
    }

    /// Regex source matching a group's declaration header through `{`
    fn header_pattern(&self, group: TargetGroup) -> String {
        format!(
            r"(?m)^[ \t]*(?:(?:public|internal|fileprivate|private|open)\s+)?enum\s+{}\s*:\s*{}\b[^{{\n]*\{{",
            regex::escape(group.declaration_name()),
            regex::escape(&self.storage_type)
        )
    }

    /// Find a group's block, trying the single-unit match first
    pub fn locate(&self, text: &str, group: TargetGroup) -> Option<BlockSpan> {
        self.locate_structural(text, group)
            .or_else(|| self.locate_by_lines(text, group))
    }

    /// Match header and a brace-free body as one unit.
    ///
    /// `//` comments in the body must not contain braces and must end
    /// before the closing brace's line.
    pub fn locate_structural(&self, text: &str, group: TargetGroup) -> Option<BlockSpan> {
        let pattern = format!(
            r"{}((?:[^{{}}/]|/[^/{{}}]|//[^{{}}\n]*\n)*)\}}",
            self.header_pattern(group)
        );
        let re = Regex::new(&pattern).ok()?;
        let caps = re.captures(text)?;
        let whole = caps.get(0)?;
        let body = caps.get(1)?;
        Some(BlockSpan {
            header: whole.start()..body.start(),
            body: body.range(),
            block: whole.range(),
            matched_by: BlockMatch::Structural,
        })
    }

    /// Find the header line, then count braces line by line until the
    /// block closes. Braces inside `//` comments and string literals are
    /// not counted.
    pub fn locate_by_lines(&self, text: &str, group: TargetGroup) -> Option<BlockSpan> {
        let header_re = Regex::new(&self.header_pattern(group)).ok()?;
        let header = header_re.find(text)?;

        let mut depth: i64 = 0;
        let mut offset = header.start();
        for line in text[header.start()..].split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            for (i, delta) in brace_deltas(line) {
                depth += delta;
                if depth <= 0 && delta < 0 {
                    let close = line_start + i;
                    return Some(BlockSpan {
                        header: header.start()..header.end(),
                        body: header.end()..close,
                        block: header.start()..close + 1,
                        matched_by: BlockMatch::LineScan,
                    });
                }
            }
        }
        None
    }
}

/// Positions of `{` (+1) and `}` (-1) outside comments and strings
fn brace_deltas(line: &str) -> Vec<(usize, i64)> {
    let mut deltas = Vec::new();
    let mut in_string = false;
    let mut prev = '\0';
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if in_string {
            if c == '"' && prev != '\\' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '/' if chars.peek().map(|(_, n)| *n) == Some('/') => break,
                '{' => deltas.push((i, 1)),
                '}' => deltas.push((i, -1)),
                _ => {}
            }
        }
        prev = c;
    }
    deltas
}

/// Parse one `case name = value [,] [// comment]` line
pub fn parse_case_line(line: &str) -> Option<(String, i64, Option<String>)> {
    let caps = CASE_LINE.captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let value = parse_swift_int(caps.get(2)?.as_str())?;
    let comment = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty());
    Some((name, value, comment))
}

/// Parse a Swift integer literal (decimal or `0x` hex, `_` separators allowed)
pub fn parse_swift_int(text: &str) -> Option<i64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// 1-indexed line number of a byte offset
pub fn line_number(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Parse the case lines of a located block
pub fn parse_block(text: &str, group: TargetGroup, span: BlockSpan) -> GroupBlock {
    let mut cases = Vec::new();
    let mut indent = None;
    let mut offset = span.body.start;

    for line in text[span.body.clone()].split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let Some((name, value, comment)) = parse_case_line(line) else {
            continue;
        };
        if indent.is_none() {
            let width = line.len() - line.trim_start().len();
            indent = Some(line[..width].to_string());
        }
        cases.push(TargetCase {
            name,
            value,
            comment,
            position: Some(line_number(text, line_start)),
        });
    }

    GroupBlock {
        group,
        span,
        cases,
        indent: indent.unwrap_or_else(|| "    ".to_string()),
    }
}

/// The parsed contents of a declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDeclaration {
    pub blocks: BTreeMap<TargetGroup, BlockLookup>,
    pub marker: Option<SyncMarker>,
}

impl TargetDeclaration {
    pub fn parse(text: &str, layout: &TargetLayout) -> Self {
        let mut blocks = BTreeMap::new();
        for group in TargetGroup::ALL {
            let lookup = match layout.locate(text, group) {
                Some(span) => BlockLookup::Found(parse_block(text, group, span)),
                None => {
                    tracing::warn!(
                        "{} enum not found in target file; treating it as empty",
                        group
                    );
                    BlockLookup::Missing
                }
            };
            blocks.insert(group, lookup);
        }

        Self {
            blocks,
            marker: parse_sync_marker(text),
        }
    }

    pub fn lookup(&self, group: TargetGroup) -> &BlockLookup {
        static MISSING: BlockLookup = BlockLookup::Missing;
        self.blocks.get(&group).unwrap_or(&MISSING)
    }

    pub fn cases(&self, group: TargetGroup) -> &[TargetCase] {
        self.lookup(group).cases()
    }
}

/// Read the sync marker, if the file carries one
pub fn parse_sync_marker(text: &str) -> Option<SyncMarker> {
    let caps = SYNC_MARKER.captures(text)?;
    Some(SyncMarker {
        label: caps[1].to_string(),
        version: caps[2].to_string(),
        date: caps[3].to_string(),
    })
}
