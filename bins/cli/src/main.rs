//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    run_collections_get, run_collections_list, run_config_show, run_model_check, run_validate,
};
use embed_preflight_adapters::log_sink::StderrLogSink;
use embed_preflight_adapters::logger::{JsonLogger, TextLogger};
use embed_preflight_infra::{InfraError, redact_if_secret, std_env_snapshot};
use embed_preflight_ports::{LogLevel, LoggerPort};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "embed-preflight",
    version,
    about = "Startup checks for the document embedding pipeline",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Optional config file path (JSON/TOML); environment variables win over it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every preflight check; exits non-zero on the first failure.
    Validate,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Search collection queries.
    Collections {
        #[command(subcommand)]
        command: CollectionsCommands,
    },
    /// Embedding model queries.
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective config after applying `ENV_*` overrides.
    Show,
}

#[derive(Debug, Subcommand)]
enum CollectionsCommands {
    /// List every collection at the configured endpoint.
    List,
    /// Fetch the first page of documents in a collection (service default size).
    Get {
        /// Collection name (defaults to the configured collection).
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ModelCommands {
    /// Check that the configured embedding model exists in the configured region.
    Check,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

/// Inputs shared by every command.
pub(crate) struct Invocation {
    pub mode: OutputMode,
    pub env: BTreeMap<String, String>,
    pub config_path: Option<PathBuf>,
}

impl Invocation {
    pub(crate) fn logger(&self) -> Arc<dyn LoggerPort> {
        let min_level = if self.mode.quiet {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        if self.mode.is_json() {
            Arc::new(JsonLogger::new(Arc::new(StderrLogSink)).with_min_level(min_level))
        } else {
            Arc::new(TextLogger::new(Arc::new(StderrLogSink)).with_min_level(min_level))
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let invocation = Invocation {
        mode: OutputMode::from_args(&cli.output),
        env: std_env_snapshot(),
        config_path: cli.config,
    };

    match run(&cli.command, &invocation) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, invocation: &Invocation) -> Result<CliOutput, CliError> {
    match command {
        Commands::Validate => run_validate(invocation),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(invocation),
        },
        Commands::Collections { command } => match command {
            CollectionsCommands::List => run_collections_list(invocation),
            CollectionsCommands::Get { name } => run_collections_get(invocation, name.as_deref()),
        },
        Commands::Model { command } => match command {
            ModelCommands::Check => run_model_check(invocation),
        },
    }
}

/// Error payload with secret metadata values redacted.
pub(crate) fn error_json(error: &InfraError) -> serde_json::Value {
    let metadata: serde_json::Map<String, serde_json::Value> = error
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), redact_if_secret(key, value).into()))
        .collect();
    serde_json::json!({
        "code": error.code.to_string(),
        "category": category_name(error),
        "kind": error.kind.to_string(),
        "message": error.message,
        "metadata": metadata,
    })
}

fn category_name(error: &InfraError) -> &'static str {
    match ExitCode::for_error(error) {
        ExitCode::Configuration => "configuration",
        ExitCode::NotFound => "dependency_not_found",
        ExitCode::Transport => "transport",
        ExitCode::Ok | ExitCode::Internal => "internal",
    }
}

pub(crate) fn format_error_text(error: &InfraError) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_string());
    out.push('\n');
    out.push_str("category: ");
    out.push_str(category_name(error));
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    for (key, value) in &error.metadata {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&redact_if_secret(key, value));
        out.push('\n');
    }
    out
}

pub(crate) fn format_error_output(mode: OutputMode, error: &InfraError) -> CliOutput {
    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error_json(error),
        });
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(error)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::for_error(error),
    }
}

pub(crate) fn json_output(payload: &serde_json::Value) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(payload)?;
    output.push('\n');
    Ok(output)
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
