//! Structural equivalence between definitions.
//!
//! Two definitions denote "the same" definition when all of the following
//! hold, checked in order with the first failure short-circuiting:
//!
//! 1. kind equality: only function/method definitions are ever collected,
//!    so this holds by construction of the typed candidate model;
//! 2. name equality;
//! 3. parameter-signature equality under canonical rendering, which absorbs
//!    formatting differences but not names, defaults, annotations, or
//!    ordering;
//! 4. context-kind equality: module-level functions never match methods;
//! 5. for class contexts, class-name equality and base-list equality under
//!    the same canonical rendering.
//!
//! Identity never involves position or body contents. The predicate is
//! symmetric: the rewriter uses it destination-to-source for lookup and
//! source-to-destination for the coverage check.
//!
//! Lookup iterates candidates in insertion order and returns the first
//! satisfying one, so selection is deterministic even when two candidates
//! share an identity; the shadowed duplicate is reported at `warn`.

use tracing::warn;

use crate::scan::{Candidate, CandidateSet, Context};

/// Pairwise structural-equivalence predicate. Symmetric.
pub fn candidates_match(a: &Candidate, b: &Candidate) -> bool {
    if a.def.name != b.def.name {
        return false;
    }
    if a.def.params != b.def.params {
        return false;
    }
    contexts_match(&a.context, &b.context)
}

fn contexts_match(a: &Context, b: &Context) -> bool {
    match (a, b) {
        (Context::Module, Context::Module) => true,
        (
            Context::Class {
                name: a_name,
                bases: a_bases,
            },
            Context::Class {
                name: b_name,
                bases: b_bases,
            },
        ) => a_name == b_name && a_bases == b_bases,
        _ => false,
    }
}

/// Find the first candidate in insertion order equivalent to `dest`.
///
/// Returns the candidate's position in the set along with the candidate,
/// or `None` when no candidate matches.
pub fn find_match<'set>(
    dest: &Candidate,
    candidates: &'set CandidateSet,
) -> Option<(usize, &'set Candidate)> {
    candidates
        .iter()
        .enumerate()
        .find(|(_, candidate)| candidates_match(dest, candidate))
}

/// Report every candidate whose identity duplicates an earlier one.
///
/// The earlier candidate wins every lookup; the later one still counts as
/// covered, so the run proceeds.
pub fn warn_shadowed_duplicates(candidates: &CandidateSet) {
    let all: Vec<&Candidate> = candidates.iter().collect();
    for (index, later) in all.iter().enumerate() {
        if let Some(first) = all[..index]
            .iter()
            .find(|earlier| candidates_match(earlier, later))
        {
            warn!(
                name = %later.def.name,
                line = later.def.line,
                shadowed_by_line = first.def.line,
                "duplicate candidate identity; the earlier definition wins"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
