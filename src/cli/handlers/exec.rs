//! Handler for the `exec` command

use crate::cli::OutputFormatter;
use crate::command::{CommandRunner, Verbosity};
use crate::config::Settings;
use crate::error::{ArtusError, Result};
use crate::here;
use std::path::PathBuf;

/// Run `commands` as one batch
///
/// The outcome of the last attempted command is printed; a non-zero exit
/// code makes the whole invocation fail.
pub fn handle_exec(
    commands: &[String],
    verbosity: Option<Verbosity>,
    cwd: Option<PathBuf>,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    let mut command_settings = settings.command.clone();
    if let Some(verbosity) = verbosity {
        command_settings.verbosity = verbosity;
    }
    if let Some(cwd) = cwd {
        command_settings.working_dir = cwd;
    }

    let outcome = CommandRunner::new(command_settings).run(commands, here!());

    if output.is_json() {
        output.print_json(&outcome)?;
    } else {
        for line in &outcome.lines {
            output.info(line);
        }
    }

    if outcome.success() {
        Ok(())
    } else {
        Err(ArtusError::CommandFailed {
            code: outcome.code,
            output: outcome.lines.join("\n"),
        })
    }
}
