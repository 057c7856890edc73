//! Candidate collection: definitions paired with their enclosing context.
//!
//! The traversal here is shared by both sides of the pipeline. The source
//! file goes through [`CandidateSet::collect`]; the destination rewriter
//! drives the same [`for_each_definition`] walk so that both sides see
//! exactly the same set of definitions under exactly the same rules:
//!
//! - direct children of the module body and of class bodies participate;
//! - class definitions are recursed into (at any nesting depth) but are
//!   never definitions themselves;
//! - a decorated definition resolves to its inner definition for identity,
//!   while its span covers the decorators too;
//! - function bodies are never entered, so nested functions are invisible;
//! - other compound statements (`if`, `try`, `with`, ...) are not entered.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use tree_sitter::Node;

use crate::error::{GraftError, GraftResult};
use crate::parse::{canonical_text, ParsedFile, Span};

// ============================================================================
// Typed model
// ============================================================================

/// Immediate enclosing scope of a definition.
///
/// Contexts are compared one level up only: a method's context is its
/// direct class, regardless of what encloses that class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Module level; no name, no signature.
    Module,
    /// Class level. `bases` holds the canonical rendering of the base-class
    /// argument list; an empty `()` list is normalized to `None`, so
    /// `class A:` and `class A():` carry the same context.
    Class {
        name: String,
        bases: Option<String>,
    },
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Module => write!(f, "module"),
            Context::Class { name, .. } => write!(f, "class {name}"),
        }
    }
}

/// A function or method definition extracted from a parsed file.
///
/// Function definitions are the only kind ever collected; class
/// definitions participate as [`Context`] values instead. `span` and
/// `text` cover the full replacement extent, decorators included, while
/// `name`, `params`, and `line` come from the inner `def`.
#[derive(Debug, Clone)]
pub struct Definition {
    /// Identifier after `def`.
    pub name: String,
    /// Canonical rendering of the parameter list, parentheses included.
    pub params: String,
    /// Byte span of the whole definition in its file.
    pub span: Span,
    /// 1-indexed line of the `def` keyword.
    pub line: usize,
    /// Exact source slice covered by `span`.
    pub text: String,
    /// Leading whitespace of the definition's first line. The rewriter uses
    /// it to rebase replacement text when source and destination sit at
    /// different nesting depths.
    pub indent: String,
}

/// A definition paired with its enclosing context.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub def: Definition,
    pub context: Context,
}

// ============================================================================
// Shared traversal
// ============================================================================

/// Walk every definition in `file` in traversal order (top to bottom,
/// class bodies in place), invoking `visit` once per definition.
pub fn for_each_definition<F>(file: &ParsedFile, mut visit: F)
where
    F: FnMut(Candidate),
{
    walk_body(file, file.root(), &Context::Module, &mut visit);
}

fn walk_body<F>(file: &ParsedFile, body: Node<'_>, context: &Context, visit: &mut F)
where
    F: FnMut(Candidate),
{
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if let Some(candidate) = function_candidate(file, child, child, context) {
                    visit(candidate);
                }
            }
            "class_definition" => {
                walk_class(file, child, visit);
            }
            "decorated_definition" => {
                let Some(inner) = child.child_by_field_name("definition") else {
                    continue;
                };
                match inner.kind() {
                    "function_definition" => {
                        // Identity from the inner def, span from the whole
                        // decorated form.
                        if let Some(candidate) = function_candidate(file, inner, child, context) {
                            visit(candidate);
                        }
                    }
                    "class_definition" => walk_class(file, inner, visit),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

fn walk_class<F>(file: &ParsedFile, class_node: Node<'_>, visit: &mut F)
where
    F: FnMut(Candidate),
{
    let context = class_context(file, class_node);
    if let Some(body) = class_node.child_by_field_name("body") {
        walk_body(file, body, &context, visit);
    }
}

fn class_context(file: &ParsedFile, class_node: Node<'_>) -> Context {
    let name = class_node
        .child_by_field_name("name")
        .map(|n| file.node_text(n).to_string())
        .unwrap_or_default();
    let bases = class_node
        .child_by_field_name("superclasses")
        .map(|n| canonical_text(n, file.text()))
        .filter(|rendered| rendered != "( )");
    Context::Class { name, bases }
}

fn function_candidate(
    file: &ParsedFile,
    def_node: Node<'_>,
    span_node: Node<'_>,
    context: &Context,
) -> Option<Candidate> {
    let name_node = def_node.child_by_field_name("name")?;
    let params_node = def_node.child_by_field_name("parameters")?;
    let span = file.node_span(span_node);
    Some(Candidate {
        def: Definition {
            name: file.node_text(name_node).to_string(),
            params: canonical_text(params_node, file.text()),
            span,
            line: def_node.start_position().row + 1,
            text: file.node_text(span_node).to_string(),
            indent: leading_indent(file.text(), span.start),
        },
        context: context.clone(),
    })
}

/// Whitespace between the start of the line containing `offset` and
/// `offset` itself. Definitions are statements, so nothing but their
/// indentation ever precedes them on their own line.
fn leading_indent(text: &str, offset: usize) -> String {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..offset].to_string()
}

// ============================================================================
// CandidateSet
// ============================================================================

/// Source candidates in traversal order.
///
/// Built once per run from a freshly parsed source file, owned by that run,
/// and immutable afterwards. Insertion order is the lookup order, which is
/// what makes match selection deterministic when two candidates share an
/// identity.
#[derive(Debug)]
pub struct CandidateSet {
    path: PathBuf,
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Collect every candidate from a parsed source file.
    ///
    /// Fails with [`GraftError::NoDefinitions`] when the file contains no
    /// function or method definitions at all.
    pub fn collect(file: &ParsedFile) -> GraftResult<Self> {
        let mut candidates = Vec::new();
        for_each_definition(file, |candidate| {
            debug!(
                name = %candidate.def.name,
                params = %candidate.def.params,
                context = %candidate.context,
                line = candidate.def.line,
                "collected source candidate"
            );
            candidates.push(candidate);
        });

        if candidates.is_empty() {
            return Err(GraftError::no_definitions(file.path()));
        }

        Ok(CandidateSet {
            path: file.path().to_path_buf(),
            candidates,
        })
    }

    /// Source path the set was collected from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Candidates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the set is empty. Never true for a set built by
    /// [`CandidateSet::collect`].
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
