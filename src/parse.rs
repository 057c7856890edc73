//! Python parsing facade over tree-sitter.
//!
//! Everything the rest of the crate knows about Python syntax comes through
//! this module: loading and parsing a file into a [`ParsedFile`], byte
//! [`Span`]s addressing nodes in the original text, and the canonical token
//! rendering used for signature comparison.
//!
//! ## Canonical rendering
//!
//! Two parameter lists (or base-class lists) are considered equal when their
//! lexical tokens are equal, joined with single spaces, with comments
//! dropped and a trailing comma of the list itself dropped. This makes
//! comparison insensitive to whitespace, line breaks, and trailing commas
//! while remaining sensitive to names, defaults, annotations, and ordering.
//! A comma nested inside a default value is significant: `x=(1,)` stays a
//! one-tuple and never collapses into `x=(1)`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{GraftError, GraftResult};

// ============================================================================
// Span
// ============================================================================

/// Half-open byte range `[start, end)` into a parsed file's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span. `start` must not exceed `end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} exceeds end {end}");
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the span.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Whether two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

// ============================================================================
// ParsedFile
// ============================================================================

/// A Python file parsed into a tree-sitter syntax tree.
///
/// Owns the file text; nodes handed out by [`ParsedFile::root`] borrow from
/// the tree for as long as the `ParsedFile` lives. Construction fails with
/// [`GraftError::Parse`] when the grammar reports any error or missing
/// node, so downstream code only ever sees well-formed trees.
#[derive(Debug)]
pub struct ParsedFile {
    path: PathBuf,
    text: String,
    tree: Tree,
}

impl ParsedFile {
    /// Read and parse a Python file from disk.
    pub fn load(path: &Path) -> GraftResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| GraftError::read(path, e))?;
        Self::parse(path, text)
    }

    /// Parse already-loaded text. `path` is used for error reporting only.
    pub fn parse(path: &Path, text: String) -> GraftResult<Self> {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| GraftError::internal(format!("failed to load Python grammar: {e}")))?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| GraftError::internal("Python parser produced no tree"))?;

        if tree.root_node().has_error() {
            return Err(GraftError::parse(path, syntax_error_summary(&tree)));
        }

        Ok(ParsedFile {
            path: path.to_path_buf(),
            text,
            tree,
        })
    }

    /// Path this file was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Root node of the syntax tree (kind `module`).
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Exact text slice covered by a node.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// Byte span covered by a node.
    pub fn node_span(&self, node: Node<'_>) -> Span {
        Span::new(node.start_byte(), node.end_byte())
    }
}

/// Consolidate every syntax-error location into one summary line.
///
/// All offending positions are reported (1-indexed line:column), not just
/// the first, so a caller can fix the whole file in one pass.
fn syntax_error_summary(tree: &Tree) -> String {
    let mut positions = Vec::new();
    collect_error_positions(tree.root_node(), &mut positions);

    if positions.is_empty() {
        // has_error() was set but no ERROR/MISSING node surfaced; treat the
        // whole file as the offender.
        return "syntax error".to_string();
    }

    let rendered: Vec<String> = positions
        .iter()
        .map(|(line, col)| format!("{line}:{col}"))
        .collect();
    format!("syntax error at {}", rendered.join(", "))
}

fn collect_error_positions(node: Node<'_>, out: &mut Vec<(usize, usize)>) {
    if node.is_error() || node.is_missing() {
        let point = node.start_position();
        out.push((point.row + 1, point.column + 1));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_positions(child, out);
    }
}

// ============================================================================
// Canonical rendering
// ============================================================================

/// Canonical textual rendering of a node: its lexical tokens joined with
/// single spaces, comments dropped, and a trailing comma directly inside
/// the node's closing parenthesis dropped.
pub fn canonical_text(node: Node<'_>, source: &str) -> String {
    let skip = trailing_comma_range(node);
    let mut tokens: Vec<&str> = Vec::new();
    collect_leaf_tokens(node, source, skip, &mut tokens);
    tokens.join(" ")
}

/// Byte range of a comma that is a direct child of `node` immediately
/// before its closing parenthesis, if any. Only that comma is elided;
/// commas nested in deeper nodes keep their meaning.
fn trailing_comma_range(node: Node<'_>) -> Option<(usize, usize)> {
    let count = node.child_count();
    if count < 3 {
        return None;
    }
    let last = node.child(count - 1)?;
    if last.kind() != ")" {
        return None;
    }
    let prev = node.child(count - 2)?;
    if prev.kind() != "," {
        return None;
    }
    Some((prev.start_byte(), prev.end_byte()))
}

fn collect_leaf_tokens<'s>(
    node: Node<'_>,
    source: &'s str,
    skip: Option<(usize, usize)>,
    out: &mut Vec<&'s str>,
) {
    if node.child_count() == 0 {
        if node.kind() == "comment" {
            return;
        }
        if skip == Some((node.start_byte(), node.end_byte())) {
            return;
        }
        let token = &source[node.byte_range()];
        if !token.is_empty() {
            out.push(token);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_leaf_tokens(child, source, skip, out);
    }
}

// ============================================================================
// Tests
// ============================================================================
