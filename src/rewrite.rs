//! Destination rewriting: validate coverage, plan replacements, splice.
//!
//! [`DestinationRewriter`] drives the shared definition traversal over the
//! destination file in two explicit phases:
//!
//! 1. **Validation** (read-only): every destination definition is looked up
//!    against the candidate set and matches are recorded. Afterwards the
//!    coverage check runs: a candidate that matches no destination
//!    definition anywhere fails the whole run before any text changes.
//! 2. **Apply**: recorded matches become a [`RewritePlan`] of span
//!    replacements, applied in descending offset order so earlier offsets
//!    stay valid while splicing.
//!
//! Replacement is wholesale: the destination definition's full extent
//! (decorators, signature, body) is discarded in favor of the candidate's
//! rendered text. Text outside replaced spans is carried through untouched,
//! so unmatched definitions and everything between definitions stay
//! byte-identical. Contexts compare one level up only, so a candidate can
//! match a definition at a different nesting depth; its text is then
//! rebased line by line to the destination's leading indentation.
//!
//! Every plan entry carries a sha-256 fingerprint of the destination bytes
//! it replaces, computed when the plan is built and re-verified right
//! before splicing. A mismatch means the plan no longer describes the text
//! it is being applied to, which is a bug, not a user error.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{GraftError, GraftResult};
use crate::matcher::{candidates_match, find_match};
use crate::parse::{ParsedFile, Span};
use crate::scan::{for_each_definition, Candidate, CandidateSet, Context};

// ============================================================================
// Content fingerprints
// ============================================================================

/// Sha-256 fingerprint of a text slice, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash(String);

impl ContentHash {
    /// Fingerprint a text slice.
    pub fn compute(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        ContentHash(hex::encode(hasher.finalize()))
    }

    /// Hex digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Rewrite plan
// ============================================================================

/// One pending substitution: replace the destination bytes at `span`
/// (fingerprinted by `expected`) with `text`.
#[derive(Debug, Clone)]
pub struct Replacement {
    pub span: Span,
    pub expected: ContentHash,
    pub text: String,
    /// Definition name, carried for logs and verification messages.
    pub name: String,
}

/// Ordered list of pending substitutions, applied only after traversal has
/// fully completed.
#[derive(Debug, Default)]
pub struct RewritePlan {
    replacements: Vec<Replacement>,
}

impl RewritePlan {
    /// Add a replacement to the plan.
    pub fn push(&mut self, replacement: Replacement) {
        self.replacements.push(replacement);
    }

    /// Number of pending replacements.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Apply the plan to `original`, producing the rewritten text.
    ///
    /// Verifies span bounds, pairwise non-overlap, and content
    /// fingerprints before splicing. Replacements are applied from the end
    /// of the text towards the start so earlier offsets remain valid.
    pub fn apply(&self, original: &str) -> GraftResult<String> {
        let mut ordered: Vec<&Replacement> = self.replacements.iter().collect();
        ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));

        for replacement in &ordered {
            if replacement.span.end > original.len() {
                return Err(GraftError::internal(format!(
                    "replacement span {} for '{}' exceeds text length {}",
                    replacement.span,
                    replacement.name,
                    original.len()
                )));
            }
        }
        for pair in ordered.windows(2) {
            if pair[0].span.overlaps(&pair[1].span) {
                return Err(GraftError::internal(format!(
                    "overlapping replacement spans {} ('{}') and {} ('{}')",
                    pair[1].span, pair[1].name, pair[0].span, pair[0].name
                )));
            }
        }

        let mut text = original.to_string();
        for replacement in ordered {
            let current = &text[replacement.span.start..replacement.span.end];
            let actual = ContentHash::compute(current);
            if actual != replacement.expected {
                return Err(GraftError::internal(format!(
                    "content drift at {} for '{}': expected {}, found {}",
                    replacement.span,
                    replacement.name,
                    replacement.expected.as_str(),
                    actual.as_str()
                )));
            }
            text = format!(
                "{}{}{}",
                &text[..replacement.span.start],
                replacement.text,
                &text[replacement.span.end..]
            );
            debug!(name = %replacement.name, span = %replacement.span, "spliced replacement");
        }
        Ok(text)
    }
}

// ============================================================================
// Rewriter
// ============================================================================

/// Record of one applied replacement, for reporting.
#[derive(Debug, Clone)]
pub struct Replaced {
    /// Definition name.
    pub name: String,
    /// Destination context the definition was found in.
    pub context: Context,
    /// 1-indexed destination line of the replaced definition.
    pub line: usize,
}

/// Result of a successful rewrite.
#[derive(Debug)]
pub struct Rewritten {
    /// Full rewritten destination text.
    pub text: String,
    /// Replacements that were applied, in destination order.
    pub replaced: Vec<Replaced>,
}

/// Walks the destination, matches against the candidate set, and produces
/// the rewritten text. Owns nothing: borrows the parsed destination and
/// the run's candidate set for the duration of the rewrite.
pub struct DestinationRewriter<'a> {
    dest: &'a ParsedFile,
    candidates: &'a CandidateSet,
}

impl<'a> DestinationRewriter<'a> {
    pub fn new(dest: &'a ParsedFile, candidates: &'a CandidateSet) -> Self {
        DestinationRewriter { dest, candidates }
    }

    /// Run both phases and return the rewritten text.
    ///
    /// Fails with [`GraftError::UnresolvedMatches`] when any candidate has
    /// no matching destination definition; in that case no text has been
    /// produced and the destination file is untouched.
    pub fn rewrite(&self) -> GraftResult<Rewritten> {
        let (seen, matches) = self.validate();
        self.check_coverage(&seen)?;

        let mut plan = RewritePlan::default();
        let mut replaced = Vec::new();
        for (dest_index, candidate) in &matches {
            let dest_def = &seen[*dest_index];
            plan.push(Replacement {
                span: dest_def.def.span,
                expected: ContentHash::compute(&dest_def.def.text),
                text: reindent(&candidate.def.text, &candidate.def.indent, &dest_def.def.indent),
                name: dest_def.def.name.clone(),
            });
            replaced.push(Replaced {
                name: dest_def.def.name.clone(),
                context: dest_def.context.clone(),
                line: dest_def.def.line,
            });
        }

        let text = plan.apply(self.dest.text())?;
        info!(
            replacements = plan.len(),
            definitions_seen = seen.len(),
            "rewrote destination"
        );
        Ok(Rewritten { text, replaced })
    }

    /// Read-only walk: record every destination definition and the first
    /// candidate each one matches.
    fn validate(&self) -> (Vec<Candidate>, Vec<(usize, &'a Candidate)>) {
        let mut seen: Vec<Candidate> = Vec::new();
        let mut matches: Vec<(usize, &'a Candidate)> = Vec::new();
        for_each_definition(self.dest, |dest_def| {
            if let Some((index, candidate)) = find_match(&dest_def, self.candidates) {
                debug!(
                    name = %dest_def.def.name,
                    context = %dest_def.context,
                    dest_line = dest_def.def.line,
                    candidate_index = index,
                    source_line = candidate.def.line,
                    "matched destination definition"
                );
                matches.push((seen.len(), candidate));
            }
            seen.push(dest_def);
        });
        (seen, matches)
    }

    /// Coverage check: every candidate must match at least one destination
    /// definition, or the run aborts listing every offender's rendered
    /// text.
    fn check_coverage(&self, seen: &[Candidate]) -> GraftResult<()> {
        let unresolved: Vec<String> = self
            .candidates
            .iter()
            .filter(|candidate| !seen.iter().any(|dest| candidates_match(dest, candidate)))
            .map(|candidate| candidate.def.text.clone())
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(GraftError::unresolved(self.candidates.path(), unresolved))
        }
    }
}

/// Rebase `text` from one base indentation to another.
///
/// The first line is left alone; the splice target's line already carries
/// the destination indentation. Continuation lines starting with `from`
/// have that prefix swapped for `to`. Whitespace-only lines and lines
/// without the expected prefix (content inside multiline strings can sit
/// at any column) pass through unchanged.
fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index > 0 && !line.trim().is_empty() {
            if let Some(rest) = line.strip_prefix(from) {
                out.push_str(to);
                out.push_str(rest);
                continue;
            }
        }
        out.push_str(line);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
