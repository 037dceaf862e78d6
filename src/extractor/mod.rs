//! Source extraction: recover integer enums from an upstream Python tree
//!
//! Every `*.py` file below the root is parsed with tree-sitter. Classes that
//! derive from `IntEnum`/`Enum` and carry at least two literal integer members
//! become [`EnumDefinition`]s, after the protocol-surface filters from
//! [`ExtractionConfig`] are applied. A file that fails to read or parse is
//! logged and skipped; the walk always continues.

pub mod python;

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tree_sitter::Parser;

use crate::config::ExtractionConfig;
use crate::error::{Result, SyncError};
use crate::schema::{EnumCatalog, EnumDefinition};

pub use python::{parse_int_literal, ClassCandidate};

/// Counters collected during a walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub classes_seen: usize,
    pub definitions_kept: usize,
}

/// Why a class was not turned into a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotAnEnum,
    NonProtocolName,
    TooFewCases(usize),
    SkippedEnum,
    CommandPath,
    NotRetained,
}

/// Walks a source tree and collects enum definitions
pub struct SourceExtractor<'a> {
    config: &'a ExtractionConfig,
    parser: Parser,
    stats: ExtractionStats,
}

impl<'a> SourceExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Result<Self> {
        Ok(Self {
            config,
            parser: python::python_parser()?,
            stats: ExtractionStats::default(),
        })
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    /// Extract every accepted definition below `root`.
    ///
    /// Later files win when two files define a class with the same name.
    pub fn extract_all(&mut self, root: &Path) -> Result<EnumCatalog> {
        if !root.is_dir() {
            return Err(SyncError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("source directory not found: {}", root.display()),
            )));
        }

        self.stats = ExtractionStats::default();
        let mut catalog = EnumCatalog::new();

        for path in python_files(root) {
            self.stats.files_scanned += 1;
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

            let definitions = match self.extract_file(&path, &relative) {
                Ok(definitions) => definitions,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", relative.display(), e);
                    self.stats.files_skipped += 1;
                    continue;
                }
            };

            for definition in definitions {
                self.stats.definitions_kept += 1;
                if let Some(previous) = catalog.insert(definition) {
                    tracing::debug!(
                        "{} from {} replaced by a later definition",
                        previous.name,
                        previous.source_file.display()
                    );
                }
            }
        }

        tracing::info!(
            "Extracted {} enum definitions from {} files ({} skipped)",
            catalog.len(),
            self.stats.files_scanned,
            self.stats.files_skipped
        );
        Ok(catalog)
    }

    /// Parse one file and return the definitions that pass every filter
    pub fn extract_file(&mut self, path: &Path, relative: &Path) -> Result<Vec<EnumDefinition>> {
        let source = fs::read_to_string(path)?;
        self.extract_source(&source, relative)
    }

    /// Same as [`extract_file`](Self::extract_file) for in-memory source
    pub fn extract_source(&mut self, source: &str, relative: &Path) -> Result<Vec<EnumDefinition>> {
        let tree = python::parse_module(&mut self.parser, relative, source)?;
        let candidates = python::collect_classes(&tree, source, relative);

        let mut kept = Vec::new();
        for candidate in candidates {
            self.stats.classes_seen += 1;
            match self.accept(candidate, relative) {
                Ok(definition) => kept.push(definition),
                Err((name, rejection)) => {
                    tracing::trace!("{} in {}: {:?}", name, relative.display(), rejection);
                }
            }
        }
        Ok(kept)
    }

    /// Apply the enum checks and protocol-surface filters to one class
    pub fn accept(
        &self,
        candidate: ClassCandidate,
        relative: &Path,
    ) -> std::result::Result<EnumDefinition, (String, Rejection)> {
        let name_lower = candidate.name.to_lowercase();
        if self
            .config
            .skipped_name_tokens
            .iter()
            .any(|token| name_lower.contains(&token.to_lowercase()))
        {
            return Err((candidate.name, Rejection::NonProtocolName));
        }

        let Some(declared_kind) = candidate.declared_kind() else {
            return Err((candidate.name, Rejection::NotAnEnum));
        };

        if candidate.cases.len() < EnumDefinition::MIN_CASES {
            let count = candidate.cases.len();
            return Err((candidate.name, Rejection::TooFewCases(count)));
        }

        if self.config.skipped_enums.iter().any(|s| s == &candidate.name) {
            return Err((candidate.name, Rejection::SkippedEnum));
        }

        let path_lower = relative.to_string_lossy().to_lowercase();
        if !self.config.skipped_path_token.is_empty()
            && path_lower.contains(&self.config.skipped_path_token.to_lowercase())
        {
            return Err((candidate.name, Rejection::CommandPath));
        }

        if !self.config.retained_enums.is_empty()
            && !self.config.retained_enums.iter().any(|r| r == &candidate.name)
        {
            return Err((candidate.name, Rejection::NotRetained));
        }

        Ok(EnumDefinition {
            name: candidate.name,
            cases: candidate.cases,
            declared_kind,
            source_file: relative.to_path_buf(),
        })
    }
}

/// All `*.py` files below `root`, sorted by name, ignore files disregarded
fn python_files(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    builder.follow_links(false);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Walk error under {}: {}", root.display(), e);
                continue;
            }
        };
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        let is_python = entry.path().extension().is_some_and(|ext| ext == "py");
        if is_file && is_python {
            files.push(entry.into_path());
        }
    }
    files
}
