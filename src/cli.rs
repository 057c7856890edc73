//! The run pipeline: parse both files, scan, rewrite, publish.
//!
//! The binary stays thin; this module is the programmatic entry point, so
//! integration tests drive exactly the code path the CLI does. Every gate
//! before [`crate::swap::publish`] is read-only: the destination file on
//! disk is untouched unless all of them pass.

use std::path::PathBuf;

use tracing::info;

use crate::error::{GraftError, GraftResult};
use crate::matcher::warn_shadowed_duplicates;
use crate::parse::ParsedFile;
use crate::rewrite::{DestinationRewriter, Replaced};
use crate::scan::CandidateSet;
use crate::swap;

/// Inputs for one graft run.
#[derive(Debug, Clone)]
pub struct GraftRequest {
    /// File with the new definitions.
    pub src_file: PathBuf,
    /// File whose definitions get replaced.
    pub dest_file: PathBuf,
    /// Delete the pre-run destination instead of keeping a `_OLD` backup.
    pub delete_old: bool,
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct GraftReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub backup: Option<PathBuf>,
    pub replaced: Vec<Replaced>,
}

/// Execute one run end to end.
///
/// Gates, in order: both inputs must be regular files, both must parse,
/// the source must yield at least one candidate, and every candidate must
/// match somewhere in the destination. Only then is the rewritten text
/// published.
pub fn run_graft(request: &GraftRequest) -> GraftResult<GraftReport> {
    if !request.src_file.is_file() {
        return Err(GraftError::source_missing(&request.src_file));
    }
    if !request.dest_file.is_file() {
        return Err(GraftError::destination_missing(&request.dest_file));
    }

    let source = ParsedFile::load(&request.src_file)?;
    let candidates = CandidateSet::collect(&source)?;
    warn_shadowed_duplicates(&candidates);
    info!(
        source = %request.src_file.display(),
        candidates = candidates.len(),
        "collected source candidates"
    );

    let destination = ParsedFile::load(&request.dest_file)?;
    let rewritten = DestinationRewriter::new(&destination, &candidates).rewrite()?;
    let outcome = swap::publish(&request.dest_file, &rewritten.text, request.delete_old)?;

    Ok(GraftReport {
        source: request.src_file.clone(),
        destination: outcome.destination,
        backup: outcome.backup,
        replaced: rewritten.replaced,
    })
}

// ============================================================================
// Tests
// ============================================================================
