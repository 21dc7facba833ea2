// crates/frameflow-server/src/main.rs
// ============================================================================
// Module: Frameflow CLI Entry Point
// Description: Command dispatcher for serving frames and offline utilities.
// Purpose: Run the counter frame server, decode button URLs, check config.
// Dependencies: clap, frameflow-config, frameflow-core, frameflow-server, tokio
// ============================================================================

//! ## Overview
//! `frameflow serve` runs the counter demo frame with a validated config.
//! `frameflow decode-button` prints the button information embedded in a
//! target URL. `frameflow check-config` validates a configuration file.
//! Output is written with explicit stream handling; failures exit non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use frameflow_config::FrameflowConfig;
use frameflow_core::parse_button_information_from_target_url;
use frameflow_server::counter_builder;
use frameflow_server::counter_frames;
use frameflow_server::serve;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "frameflow", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the counter demo frame.
    Serve(ConfigArgs),
    /// Decode the pressed-button information embedded in a target URL.
    DecodeButton(DecodeButtonCommand),
    /// Validate a configuration file.
    CheckConfig(ConfigArgs),
}

/// Arguments for commands that read configuration.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to frameflow.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `decode-button`.
#[derive(Args, Debug)]
struct DecodeButtonCommand {
    /// Absolute button target URL.
    #[arg(value_name = "URL")]
    url: String,
}

/// CLI error wrapper carrying a printable message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        write_stdout_line(&format!("frameflow {}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(args) => command_serve(&args).await,
        Commands::DecodeButton(command) => command_decode_button(&command),
        Commands::CheckConfig(args) => command_check_config(&args),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the counter frame server.
async fn command_serve(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let builder = config
        .apply(counter_builder())
        .map_err(|err| CliError::new(format!("config apply failed: {err}")))?;
    let frames = counter_frames(builder).map_err(|err| CliError::new(err.to_string()))?;
    write_stderr_line(&format!(
        "frameflow serving {} on {}",
        frames.base_path(),
        config.server.bind
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    serve(&config, frames).await.map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints decoded button information as JSON.
fn command_decode_button(command: &DecodeButtonCommand) -> CliResult<ExitCode> {
    let decoded = decode_button(&command.url)?;
    let payload = serde_json::to_string_pretty(&decoded)
        .map_err(|err| CliError::new(format!("json encoding failed: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Validates a configuration file and prints a summary.
fn command_check_config(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args)?;
    let summary = config_summary(&config)?;
    let payload = serde_json::to_string_pretty(&summary)
        .map_err(|err| CliError::new(format!("json encoding failed: {err}")))?;
    write_stdout_line(&payload).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(args: &ConfigArgs) -> CliResult<FrameflowConfig> {
    FrameflowConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Decodes the button information embedded in `raw`.
fn decode_button(raw: &str) -> CliResult<Value> {
    let url = Url::parse(raw.trim()).map_err(|err| CliError::new(format!("invalid url: {err}")))?;
    let button = parse_button_information_from_target_url(&url)
        .ok_or_else(|| CliError::new("url carries no button information".to_string()))?;
    serde_json::to_value(button)
        .map_err(|err| CliError::new(format!("json encoding failed: {err}")))
}

/// Summarizes the effective configuration.
fn config_summary(config: &FrameflowConfig) -> CliResult<Value> {
    let accepts = config
        .frames
        .accepted_protocols()
        .map_err(|err| CliError::new(err.to_string()))?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    Ok(json!({
        "status": "ok",
        "bind": config.server.bind,
        "base_path": config.frames.base_path,
        "max_body_bytes": config.server.max_body_bytes,
        "accepts": accepts,
    }))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream error.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
