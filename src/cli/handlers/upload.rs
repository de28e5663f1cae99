//! Handler for the `upload` command

use crate::cli::OutputFormatter;
use crate::error::Result;
use crate::upload::validate_upload;
use std::path::Path;

pub fn handle_upload(file: &Path, ext: &str, output: &OutputFormatter) -> Result<()> {
    let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    let name = file.to_str();
    let stored_as = validate_upload(name, size, ext)?;

    if output.is_json() {
        output.print_json(&serde_json::json!({ "file": stored_as, "size": size }))
    } else {
        output.success(&format!("{stored_as} accepted ({size} bytes)"));
        Ok(())
    }
}
