//! Binary entry point for the pygraft CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Replace definitions in dest.py with the versions from src.py,
//! # keeping the old file as dest_OLD.py
//! pygraft --src-file src.py --dest-file dest.py
//!
//! # Same, but delete the old destination instead of keeping a backup
//! pygraft --src-file src.py --dest-file dest.py --delete-old
//!
//! # Machine-readable summary
//! pygraft --src-file src.py --dest-file dest.py --format json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use pygraft::cli::{run_graft, GraftReport, GraftRequest};
use pygraft::error::{GraftError, OutputErrorCode};
use pygraft::output::{emit_response, render_text, ErrorResponse, GraftResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Replace Python function/method definitions in a destination file.
///
/// One source file may carry several definitions to replace; each must
/// match a destination definition by name, parameter signature, and
/// enclosing class.
#[derive(Parser, Debug)]
#[command(
    name = "pygraft",
    version,
    about = "Replace Python function/method definitions in a destination file"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// File with the new definitions.
    #[arg(long, value_name = "PATH")]
    src_file: PathBuf,

    /// File whose definitions get replaced.
    #[arg(long, value_name = "PATH")]
    dest_file: PathBuf,

    /// Delete the old destination file instead of keeping it as a
    /// uniquely-named backup next to the destination.
    #[arg(long)]
    delete_old: bool,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Global arguments shared by the whole CLI.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for the run summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text summary (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    let format = cli.format;
    match execute(cli) {
        Ok(report) => {
            let response = GraftResponse::new(
                &report.source,
                &report.destination,
                report.backup.as_deref(),
                &report.replaced,
            );
            match format {
                OutputFormat::Text => {
                    let _ = write!(io::stdout(), "{}", render_text(&response));
                }
                OutputFormat::Json => {
                    let _ = emit_response(&response, &mut io::stdout());
                }
            }
            let _ = io::stdout().flush();
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = OutputErrorCode::from(&err);
            match format {
                OutputFormat::Text => {
                    eprintln!("error: {err}");
                }
                OutputFormat::Json => {
                    let response = ErrorResponse::from_error(&err);
                    let _ = emit_response(&response, &mut io::stdout());
                    let _ = io::stdout().flush();
                }
            }
            ExitCode::from(code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the run described by the CLI arguments.
fn execute(cli: Cli) -> Result<GraftReport, GraftError> {
    run_graft(&GraftRequest {
        src_file: cli.src_file,
        dest_file: cli.dest_file,
        delete_old: cli.delete_old,
    })
}
