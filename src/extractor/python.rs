//! Python enum recovery from tree-sitter syntax trees
//!
//! Nothing is executed: classes and their members are read straight off the
//! AST. Only `NAME = <int>` and `NAME = -<int>` members count as cases, since
//! computed values, tuples and strings are not raw protocol codes.

use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Result, SyncError};
use crate::naming::normalize_constant_name;
use crate::schema::{DeclaredKind, EnumCase, SourceLocation};

/// A class definition found in a module, before any filtering
#[derive(Debug, Clone)]
pub struct ClassCandidate {
    pub name: String,
    /// Simple names of the base classes (`enum.IntEnum` -> `IntEnum`)
    pub bases: Vec<String>,
    pub cases: Vec<EnumCase>,
    /// Line of the `class` keyword (1-indexed)
    pub line: usize,
}

impl ClassCandidate {
    /// Declared enum kind, from the first enum base class
    pub fn declared_kind(&self) -> Option<DeclaredKind> {
        self.bases.iter().find_map(|base| match base.as_str() {
            "IntEnum" => Some(DeclaredKind::IntEnum),
            "Enum" => Some(DeclaredKind::PlainEnum),
            _ => None,
        })
    }
}

/// Create a parser configured for Python
pub fn python_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyncError::ParseFailure {
            path: "<python grammar>".to_string(),
            message: format!("Failed to load Python grammar: {:?}", e),
        })?;
    Ok(parser)
}

/// Parse a module, rejecting trees that contain syntax errors
pub fn parse_module(parser: &mut Parser, path: &Path, source: &str) -> Result<Tree> {
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| SyncError::ParseFailure {
            path: path.display().to_string(),
            message: "parser returned no tree".to_string(),
        })?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(&root).unwrap_or(1);
        return Err(SyncError::ParseFailure {
            path: path.display().to_string(),
            message: format!("syntax error near line {}", line),
        });
    }

    Ok(tree)
}

/// Collect every class in the module, including nested and decorated ones
pub fn collect_classes(tree: &Tree, source: &str, relative: &Path) -> Vec<ClassCandidate> {
    let mut classes = Vec::new();
    visit_all(&tree.root_node(), |node| {
        if node.kind() == "class_definition" {
            if let Some(candidate) = read_class(node, source, relative) {
                classes.push(candidate);
            }
        }
    });
    classes
}

fn read_class(node: &Node, source: &str, relative: &Path) -> Option<ClassCandidate> {
    let name = get_node_text(&node.child_by_field_name("name")?, source);

    let bases = node
        .child_by_field_name("superclasses")
        .map(|list| base_names(&list, source))
        .unwrap_or_default();

    let cases = node
        .child_by_field_name("body")
        .map(|body| read_cases(&body, &name, source, relative))
        .unwrap_or_default();

    Some(ClassCandidate {
        name,
        bases,
        cases,
        line: node.start_position().row + 1,
    })
}

fn base_names(list: &Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(get_node_text(&child, source)),
            "attribute" => {
                if let Some(attr) = child.child_by_field_name("attribute") {
                    names.push(get_node_text(&attr, source));
                }
            }
            // keyword arguments (metaclass=...) are not bases
            _ => {}
        }
    }
    names
}

fn read_cases(body: &Node, class: &str, source: &str, relative: &Path) -> Vec<EnumCase> {
    let mut cases = Vec::new();
    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if let Some(case) = read_case(&assignment, class, source, relative) {
            cases.push(case);
        }
    }
    cases
}

fn read_case(assignment: &Node, class: &str, source: &str, relative: &Path) -> Option<EnumCase> {
    if assignment.kind() != "assignment" || assignment.child_by_field_name("type").is_some() {
        return None;
    }

    let target = assignment.child_by_field_name("left")?;
    if target.kind() != "identifier" {
        return None;
    }

    let right = assignment.child_by_field_name("right")?;
    let original_name = get_node_text(&target, source);
    let Some(value) = evaluate_integer(&right, source) else {
        if is_integer_expression(&right) {
            tracing::warn!(
                "Skipping {}.{} in {}: {} is not a 64-bit integer",
                class,
                original_name,
                relative.display(),
                get_node_text(&right, source)
            );
        }
        return None;
    };

    Some(EnumCase {
        name: normalize_constant_name(&original_name),
        value,
        location: SourceLocation {
            file: relative.to_path_buf(),
            line: assignment.start_position().row + 1,
        },
        original_name,
    })
}

/// Evaluate an integer literal, optionally negated or parenthesized
fn evaluate_integer(node: &Node, source: &str) -> Option<i64> {
    match node.kind() {
        "integer" => parse_int_literal(&get_node_text(node, source)),
        "unary_operator" => {
            let operator = node.child_by_field_name("operator")?;
            if operator.kind() != "-" {
                return None;
            }
            let operand = evaluate_integer(&node.child_by_field_name("argument")?, source)?;
            operand.checked_neg()
        }
        "parenthesized_expression" if node.named_child_count() == 1 => {
            evaluate_integer(&node.named_child(0)?, source)
        }
        _ => None,
    }
}

/// Same shapes as `evaluate_integer`, without reading the digits
fn is_integer_expression(node: &Node) -> bool {
    match node.kind() {
        "integer" => true,
        "unary_operator" => {
            node.child_by_field_name("operator").is_some_and(|op| op.kind() == "-")
                && node
                    .child_by_field_name("argument")
                    .is_some_and(|arg| is_integer_expression(&arg))
        }
        "parenthesized_expression" if node.named_child_count() == 1 => node
            .named_child(0)
            .is_some_and(|inner| is_integer_expression(&inner)),
        _ => false,
    }
}

/// Parse a Python integer literal (`42`, `0x80`, `0o17`, `0b101`, `1_000`)
pub fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();

    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };

    if digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

fn first_error_line(root: &Node) -> Option<usize> {
    let mut line = None;
    visit_all(root, |node| {
        if line.is_none() && (node.is_error() || node.is_missing()) {
            line = Some(node.start_position().row + 1);
        }
    });
    line
}

/// Visit all nodes in a tree (iterative to avoid stack overflow)
fn visit_all<'tree, F>(node: &Node<'tree>, mut visitor: F)
where
    F: FnMut(&Node<'tree>),
{
    let mut cursor = node.walk();
    let mut did_visit_children = false;

    loop {
        if !did_visit_children {
            visitor(&cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
        }

        if cursor.goto_next_sibling() {
            did_visit_children = false;
            continue;
        }

        if !cursor.goto_parent() {
            break;
        }
        did_visit_children = true;
    }
}
