//! Data model shared by the extraction, diff and merge stages

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Values at or above this boundary are push notifications, below it responses
pub const DEFAULT_PUSH_BOUNDARY: i64 = 0x80;

/// Where a case was defined in the upstream source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path relative to the source root
    pub file: PathBuf,

    /// Line (1-indexed)
    pub line: usize,
}

/// A single integer enum member extracted from Python source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCase {
    /// lowerCamelCase name
    pub name: String,

    /// Raw integer value
    pub value: i64,

    pub location: SourceLocation,

    /// Name as written upstream (SCREAMING_SNAKE_CASE)
    pub original_name: String,
}

impl EnumCase {
    /// File name of the defining module, without directories
    pub fn file_name(&self) -> String {
        self.location
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.location.file.display().to_string())
    }
}

/// Base class the Python enum was declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    IntEnum,
    PlainEnum,
}

/// A complete enum class recovered from the upstream library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    /// Cases in source order
    pub cases: Vec<EnumCase>,
    pub declared_kind: DeclaredKind,
    /// File path relative to the source root
    pub source_file: PathBuf,
}

impl EnumDefinition {
    /// Minimum number of integer cases for a class to count as an enum
    pub const MIN_CASES: usize = 2;

    pub fn values(&self) -> Vec<i64> {
        self.cases.iter().map(|c| c.value).collect()
    }
}

/// Enum definitions keyed by class name, in discovery order.
///
/// Inserting a name that already exists replaces the earlier definition in
/// place, so the last file to define a class wins but keeps the first slot.
#[derive(Debug, Clone, Default)]
pub struct EnumCatalog {
    definitions: Vec<EnumDefinition>,
    index: HashMap<String, usize>,
}

impl EnumCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, returning the one it replaced (if any)
    pub fn insert(&mut self, definition: EnumDefinition) -> Option<EnumDefinition> {
        match self.index.get(&definition.name) {
            Some(&slot) => Some(std::mem::replace(&mut self.definitions[slot], definition)),
            None => {
                self.index
                    .insert(definition.name.clone(), self.definitions.len());
                self.definitions.push(definition);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&EnumDefinition> {
        self.index.get(name).map(|&slot| &self.definitions[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<EnumDefinition> for EnumCatalog {
    fn from_iter<I: IntoIterator<Item = EnumDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

/// The three Swift enums the protocol codes are sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetGroup {
    Command,
    Response,
    Push,
}

impl TargetGroup {
    /// All groups, in the order they are analyzed and merged
    pub const ALL: [TargetGroup; 3] = [Self::Command, Self::Response, Self::Push];

    /// Name of the Swift enum declaration for this group
    pub fn declaration_name(&self) -> &'static str {
        match self {
            Self::Command => "CommandCode",
            Self::Response => "ResponseCode",
            Self::Push => "PushCode",
        }
    }

    /// Whether an extracted value belongs to this group's value range.
    ///
    /// Commands have no range restriction.
    pub fn accepts_value(&self, value: i64, push_boundary: i64) -> bool {
        match self {
            Self::Command => true,
            Self::Response => value < push_boundary,
            Self::Push => value >= push_boundary,
        }
    }
}

impl fmt::Display for TargetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.declaration_name())
    }
}

/// An existing case parsed from the Swift declaration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCase {
    pub name: String,
    pub value: i64,
    /// Trailing `//` comment on the same line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Line in the target file (1-indexed), for diagnostics only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Differences between the extracted and existing cases of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAnalysis {
    pub target_group: TargetGroup,
    /// Cases with no existing match by name or value
    pub additions: Vec<EnumCase>,
    /// Same name as an existing case but a different value (reported only)
    pub updates: Vec<(EnumCase, TargetCase)>,
    /// Value already used by an existing case under another name
    pub duplicates: Vec<EnumCase>,
    /// Existing cases with no extracted counterpart (never removed)
    pub target_only_extras: Vec<TargetCase>,
    /// Extracted cases already present in the target
    pub covered: Vec<EnumCase>,
}

impl ChangeAnalysis {
    pub fn new(target_group: TargetGroup) -> Self {
        Self {
            target_group,
            additions: Vec::new(),
            updates: Vec::new(),
            duplicates: Vec::new(),
            target_only_extras: Vec::new(),
            covered: Vec::new(),
        }
    }

    pub fn has_additions(&self) -> bool {
        !self.additions.is_empty()
    }
}

/// Metadata about an upstream GitHub release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub tag: String,
    pub name: String,
    pub download_url: String,
    pub published_at: String,
}
