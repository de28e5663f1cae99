//! Handler for the `counter` commands

use crate::cli::{CounterCommands, OutputFormatter};
use crate::error::Result;
use crate::numbering;
use std::path::Path;

pub fn handle_counter_command(command: CounterCommands, output: &OutputFormatter) -> Result<()> {
    match command {
        CounterCommands::Next { path } => {
            let number = numbering::allocate(&path)?;
            report(output, &path, "allocated", number)
        },
        CounterCommands::Release { path, number } => {
            let before = numbering::current(&path)?;
            let current = numbering::deallocate(&path, number)?;
            let released = number > 0 && before == number && current == number - 1;
            if !released {
                output.warning(&format!(
                    "{number} is not the last issued number; counter left at {current}"
                ));
            }
            report(output, &path, "current", current)
        },
        CounterCommands::Show { path } => {
            let current = numbering::current(&path)?;
            report(output, &path, "current", current)
        },
    }
}

fn report(output: &OutputFormatter, path: &Path, label: &str, number: u64) -> Result<()> {
    if output.is_json() {
        output.print_json(&serde_json::json!({
            "counter": path,
            label: number,
        }))
    } else {
        output.info(&number.to_string());
        Ok(())
    }
}
