//! artus-util - Ticket numbering and Subversion helpers for Artus
//!
//! This is the main entry point for the artus-util CLI application.
//! It handles command-line argument parsing and dispatches to the appropriate
//! command handlers.

use artus_util::cli::{Cli, Commands, OutputFormatter, handlers};
use artus_util::config::Settings;
use artus_util::error::{ArtusError, Result};
use artus_util::logging;
use clap::Parser;
use std::process;

/// Main entry point for the artus-util CLI
///
/// Parses command-line arguments and executes the requested command.
/// Handles errors gracefully and provides helpful error messages to users.
fn main() {
    let cli = Cli::parse();

    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Run the CLI application with the parsed arguments
///
/// # Errors
///
/// Returns any error that occurs during command execution
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    logging::init(cli.verbose);

    // Raw counters and upload checks work without any settings
    match cli.command {
        Commands::Counter { command } => handlers::handle_counter_command(command, formatter),
        Commands::Upload { file, ext } => handlers::handle_upload(&file, &ext, formatter),
        command => {
            let settings = Settings::load(cli.config.as_deref())?;
            tracing::debug!(config = ?cli.config, "settings loaded");
            dispatch_command(command, &settings, formatter)
        },
    }
}

fn dispatch_command(
    command: Commands,
    settings: &Settings,
    formatter: &OutputFormatter,
) -> Result<()> {
    match command {
        Commands::Chrono { command } => handlers::handle_chrono_command(command, settings, formatter),
        Commands::Exec {
            commands,
            verbosity,
            cwd,
        } => handlers::handle_exec(&commands, verbosity, cwd, settings, formatter),
        Commands::Url { command } => handlers::handle_url_command(command, settings, formatter),
        Commands::Skills { command } => handlers::handle_skills_command(command, settings, formatter),
        Commands::Users { command } => handlers::handle_users_command(command, settings, formatter),
        Commands::Notify { command } => handlers::handle_notify_command(command, settings, formatter),
        Commands::Config { command } => handlers::handle_config_command(command, settings, formatter),
        Commands::Counter { command } => handlers::handle_counter_command(command, formatter),
        Commands::Upload { file, ext } => handlers::handle_upload(&file, &ext, formatter),
    }
}

/// Handle errors and display them to the user
///
/// Prints the main message and any suggestions. In JSON mode the error is
/// also emitted as an object on stdout, and the debug representation is
/// added when debug logging is on.
fn handle_error(error: &ArtusError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        let _ = formatter.json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "error_type": format!("{:?}", error),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
