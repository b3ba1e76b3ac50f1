//! Binary entry point for the scopewalk CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Describe every scope and binding
//! scopewalk scopes tree.json
//!
//! # Rename a binding visible in the program scope
//! scopewalk rename tree.json --from a --to count
//!
//! # Mint three fresh names
//! scopewalk uid tree.json --seed ref --count 3
//!
//! # Evaluate top-level expression statements
//! scopewalk evaluate tree.json
//! ```

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use scopewalk::cli::{load_session, run_evaluate, run_rename, run_scopes, run_uid};
use scopewalk::config::Config;
use scopewalk::error::{CliError, OutputErrorCode};
use scopewalk::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Scope analysis for ESTree JSON trees.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "scopewalk", version, about = "Scope analysis for ESTree JSON trees")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: scopewalk.json in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

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

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List scopes, their bindings and the program globals.
    Scopes {
        /// ESTree JSON file.
        input: PathBuf,
    },
    /// Rename a binding and print the rewritten tree.
    Rename {
        /// ESTree JSON file.
        input: PathBuf,
        /// Current name.
        #[arg(long)]
        from: String,
        /// New name.
        #[arg(long)]
        to: String,
        /// Dotted path of a node whose scope to start from (e.g. `body.1.body`).
        #[arg(long)]
        scope_of: Option<String>,
    },
    /// Generate names unused anywhere in the program.
    Uid {
        /// ESTree JSON file.
        input: PathBuf,
        /// Base for the generated names.
        #[arg(long, default_value = "temp")]
        seed: String,
        /// How many names to generate.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Evaluate top-level expression statements.
    Evaluate {
        /// ESTree JSON file.
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
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

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), CliError> {
    let cwd = env::current_dir().map_err(|e| CliError::internal(e.to_string()))?;
    let config = Config::load(cli.global.config.as_deref(), &cwd)?;
    let options = config.traverse;

    match cli.command {
        Command::Scopes { input } => {
            let mut session = load_session(&input, options)?;
            emit(&run_scopes(&mut session)?)
        }
        Command::Rename {
            input,
            from,
            to,
            scope_of,
        } => {
            let mut session = load_session(&input, options)?;
            emit(&run_rename(&mut session, &from, &to, scope_of.as_deref())?)
        }
        Command::Uid { input, seed, count } => {
            let mut session = load_session(&input, options)?;
            emit(&run_uid(&mut session, &seed, count)?)
        }
        Command::Evaluate { input } => {
            let mut session = load_session(&input, options)?;
            emit(&run_evaluate(&mut session)?)
        }
    }
}

fn emit<T: Serialize>(response: &T) -> Result<(), CliError> {
    emit_response(response, &mut io::stdout()).map_err(|e| CliError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}
