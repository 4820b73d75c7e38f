//! Source-unit extraction.
//!
//! Parses one changed file and enumerates its analyzable function-like
//! regions in source order. Source order is the canonical ordering used by
//! every downstream component, so the extractor sorts its query matches by
//! byte offset instead of trusting cursor iteration.

use crate::core::AnalysisError;
use crate::source::language;
use serde::{Deserialize, Serialize};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    FunctionDeclaration,
    GeneratorFunction,
    FunctionExpression,
    ArrowFunction,
    Method,
}

/// One analyzable function-like region. Immutable once extracted; the byte
/// range is the handle back into the owning file's syntax tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Stable identifier: `path:name:startLine`.
    pub id: String,

    pub path: String,

    pub name: String,

    pub kind: UnitKind,

    pub start_byte: usize,
    pub end_byte: usize,

    /// 1-based, as the reporting layer expects.
    pub start_line: usize,
    pub end_line: usize,
}

/// A parsed file: owns the source text and the syntax tree for one run.
pub struct ParsedFile {
    pub path: String,
    pub source: String,
    pub tree: Tree,
}

impl ParsedFile {
    /// The syntax node for a unit, recovered from its byte range.
    pub fn unit_node(&self, unit: &SourceUnit) -> Option<Node<'_>> {
        self.tree
            .root_node()
            .descendant_for_byte_range(unit.start_byte, unit.end_byte)
    }
}

const UNIT_QUERY: &str = r#"
(function_declaration name: (identifier) @name) @unit
(generator_function_declaration name: (identifier) @name) @unit
(method_definition name: (property_identifier) @name) @unit
(variable_declarator
  name: (identifier) @name
  value: [(arrow_function) (function_expression)] @unit)
"#;

pub struct SourceUnitExtractor;

impl SourceUnitExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parses one file. Malformed syntax is a `Parse` error carrying the
    /// file path and first error location, never a panic and never a raw
    /// parser artifact.
    pub fn parse(&self, path: &str, source: &str) -> Result<ParsedFile, AnalysisError> {
        let language = language::language_for_path(path)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage { file: path.to_string() })?;

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| AnalysisError::parse(path, format!("grammar rejected: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::parse(path, "parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error_node(root) {
                Some(node) => format!(
                    "syntax error near line {}, column {}",
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                None => "syntax error".to_string(),
            };
            return Err(AnalysisError::parse(path, message));
        }

        Ok(ParsedFile {
            path: path.to_string(),
            source: source.to_string(),
            tree,
        })
    }

    /// Enumerates units in source order. A file with zero functions yields
    /// an empty list, which is a valid outcome, not an error.
    pub fn extract_units(&self, file: &ParsedFile) -> Vec<SourceUnit> {
        let language = match language::language_for_path(&file.path) {
            Some(language) => language,
            None => return Vec::new(),
        };

        let query = match Query::new(&language, UNIT_QUERY) {
            Ok(query) => query,
            Err(e) => {
                // The query is a compile-time constant; failing here means a
                // grammar/query mismatch, which must not take the run down.
                tracing::warn!(file = %file.path, error = %e, "unit query failed to compile");
                return Vec::new();
            }
        };

        let name_index = query.capture_index_for_name("name");
        let unit_index = query.capture_index_for_name("unit");
        let (Some(name_index), Some(unit_index)) = (name_index, unit_index) else {
            return Vec::new();
        };

        let mut units = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, file.tree.root_node(), file.source.as_bytes());

        while let Some(m) = matches.next() {
            let mut name = None;
            let mut unit_node = None;
            for capture in m.captures {
                if capture.index == name_index {
                    name = capture.node.utf8_text(file.source.as_bytes()).ok();
                } else if capture.index == unit_index {
                    unit_node = Some(capture.node);
                }
            }
            let (Some(name), Some(node)) = (name, unit_node) else {
                continue;
            };
            let Some(kind) = unit_kind(node.kind()) else {
                continue;
            };
            units.push(SourceUnit {
                id: format!("{}:{}:{}", file.path, name, node.start_position().row + 1),
                path: file.path.clone(),
                name: name.to_string(),
                kind,
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
        }

        units.sort_by_key(|unit| (unit.start_byte, unit.end_byte));
        units
    }
}

impl Default for SourceUnitExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn unit_kind(node_kind: &str) -> Option<UnitKind> {
    match node_kind {
        language::node_kinds::FUNCTION_DECLARATION => Some(UnitKind::FunctionDeclaration),
        language::node_kinds::GENERATOR_FUNCTION_DECLARATION => Some(UnitKind::GeneratorFunction),
        language::node_kinds::FUNCTION_EXPRESSION => Some(UnitKind::FunctionExpression),
        language::node_kinds::ARROW_FUNCTION => Some(UnitKind::ArrowFunction),
        language::node_kinds::METHOD_DEFINITION => Some(UnitKind::Method),
        _ => None,
    }
}

fn first_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() || child.is_missing() {
                if let Some(found) = first_error_node(child) {
                    return Some(found);
                }
            }
        }
    }
    Some(node)
}
