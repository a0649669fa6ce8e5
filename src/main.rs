//! Binary entry point for the typesift CLI.
//!
//! ## Usage
//!
//! ```bash
//! # List the types matching a filter expression
//! typesift select --module build/module.json --filter 'namespace:App.Services.* and not sealed'
//!
//! # Check one rule (exit code 1 when it fails)
//! typesift check --module build/module.json --that 'namespace:App.Domain.*' \
//!     --should 'depends:App.Web.*' --negate
//!
//! # Check every rule in typesift.toml
//! typesift rules
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use typesift::cli::{load_module, resolve_module_path, run_check, run_rules, run_select};
use typesift::config::Config;
use typesift::error::{OutputErrorCode, SiftError, RULE_FAILED_EXIT_CODE};
use typesift::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Declarative type selection and architecture rules.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "typesift", version, about = "Declarative type selection and architecture rules")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Module document (default: `[module] path` from config).
    #[arg(long, global = true)]
    module: Option<PathBuf>,

    /// Config file (default: typesift.toml in the current directory).
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

#[derive(Subcommand, Debug)]
enum Command {
    /// List the types matching a filter expression.
    Select {
        /// Filter expression, e.g. `name:*Service and sealed`.
        #[arg(long)]
        filter: String,
    },
    /// Check one rule against the module.
    Check {
        /// Expression selecting the types under test (default: all types).
        #[arg(long)]
        that: Option<String>,
        /// Expression every selected type must satisfy.
        #[arg(long)]
        should: String,
        /// Selected types must NOT satisfy `--should`.
        #[arg(long)]
        negate: bool,
    },
    /// Check every rule defined in the config file.
    Rules,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(RULE_FAILED_EXIT_CODE),
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, same as responses
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

/// Execute the CLI command. Returns whether every checked rule passed.
fn execute(cli: Cli) -> Result<bool, SiftError> {
    let config = load_config(&cli.global)?;
    let module_path = resolve_module_path(cli.global.module.clone(), &config)?;
    let module = load_module(&module_path)?;

    match cli.command {
        Command::Select { filter } => {
            let response = run_select(&module, &filter)?;
            emit(&response)?;
            Ok(true)
        }
        Command::Check {
            that,
            should,
            negate,
        } => {
            let response = run_check(&module, that.as_deref(), &should, negate)?;
            emit(&response)?;
            Ok(response.passed())
        }
        Command::Rules => {
            let response = run_rules(&module, &config)?;
            emit(&response)?;
            Ok(response.passed)
        }
    }
}

fn load_config(global: &GlobalArgs) -> Result<Config, SiftError> {
    match &global.config {
        Some(path) => Config::load(path),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| SiftError::internal(format!("failed to get current directory: {}", e)))?;
            Config::load_from_project(&cwd)
        }
    }
}

fn emit<T: Serialize>(response: &T) -> Result<(), SiftError> {
    emit_response(response, &mut io::stdout()).map_err(|e| SiftError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}
