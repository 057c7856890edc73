//! JSON output envelopes and text rendering for the CLI.
//!
//! Envelope rules, applied to every response:
//!
//! 1. **Status first**: every response starts with a `status` field
//! 2. **Versioned**: an explicit `schema_version` enables forward
//!    compatibility
//! 3. **Deterministic**: same run, same output (field order is declaration
//!    order, `replaced` preserves destination order)
//! 4. **Absent means absent**: `Option` fields are skipped when `None`
//!    rather than serialized as `null`
//!
//! The `Info` suffix marks serialization carriers converted from internal
//! types ([`crate::rewrite::Replaced`] stays a domain type; [`ReplacedInfo`]
//! is what goes on the wire).

use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraftError;
use crate::rewrite::Replaced;
use crate::scan::Context;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Success envelope
// ============================================================================

/// One applied replacement, for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacedInfo {
    /// Definition name.
    pub name: String,
    /// Enclosing class name; absent for module-level definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// 1-indexed destination line of the replaced definition.
    pub line: usize,
}

impl ReplacedInfo {
    /// Convert an applied replacement into its output carrier.
    pub fn from_replaced(replaced: &Replaced) -> Self {
        let class = match &replaced.context {
            Context::Module => None,
            Context::Class { name, .. } => Some(name.clone()),
        };
        ReplacedInfo {
            name: replaced.name.clone(),
            class,
            line: replaced.line,
        }
    }

    /// `Class.name` for methods, plain `name` for module-level functions.
    pub fn qualified_name(&self) -> String {
        match &self.class {
            Some(class) => format!("{class}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Successful-run response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraftResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Source file the candidates came from.
    pub source: String,
    /// Destination file that was rewritten.
    pub destination: String,
    /// Backup file holding the pre-run destination, if one was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    /// Applied replacements, in destination order.
    pub replaced: Vec<ReplacedInfo>,
}

impl GraftResponse {
    /// Build a success response from the run's outcome.
    pub fn new(
        source: &Path,
        destination: &Path,
        backup: Option<&Path>,
        replaced: &[Replaced],
    ) -> Self {
        GraftResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            source: source.display().to_string(),
            destination: destination.display().to_string(),
            backup: backup.map(|p| p.display().to_string()),
            replaced: replaced.iter().map(ReplacedInfo::from_replaced).collect(),
        }
    }
}

// ============================================================================
// Error envelope
// ============================================================================

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (also the process exit code).
    pub code: u8,
    /// Human-readable message; multi-offender failures list every case.
    pub message: String,
}

impl ErrorInfo {
    /// Build error info from a pipeline error.
    pub fn from_error(err: &GraftError) -> Self {
        ErrorInfo {
            code: err.error_code().code(),
            message: err.to_string(),
        }
    }
}

/// Failed-run response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Build an error response from a pipeline error.
    pub fn from_error(err: &GraftError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// The output is deterministic: same run, identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Render a success response as a short human-readable summary.
pub fn render_text(response: &GraftResponse) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for replaced in &response.replaced {
        let _ = writeln!(
            out,
            "replaced {} at {}:{}",
            replaced.qualified_name(),
            response.destination,
            replaced.line
        );
    }
    match &response.backup {
        Some(backup) => {
            let _ = writeln!(out, "kept old file as {backup}");
        }
        None => {
            let _ = writeln!(out, "deleted old file");
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
