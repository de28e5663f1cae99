//! Handler for the `config` commands

use crate::cli::{ConfigCommands, OutputFormatter};
use crate::config::Settings;
use crate::error::Result;

pub fn handle_config_command(
    command: ConfigCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            if output.is_json() {
                output.print_json(settings)
            } else {
                output.info(settings.to_yaml()?.trim_end());
                Ok(())
            }
        },
        ConfigCommands::Path => {
            let path = Settings::default_path();
            if output.is_json() {
                return output.print_json(&serde_json::json!({ "path": path }));
            }
            match path {
                Some(path) => output.info(&path.display().to_string()),
                None => output.warning("No home directory; settings come from the environment only"),
            }
            Ok(())
        },
    }
}
