//! Terminal and JSON output

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Prints command results either as coloured text or as JSON
///
/// In JSON mode only JSON documents go to stdout; human-readable messages
/// are dropped, except errors, which always go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || std::env::var_os("NO_COLOR").is_some() {
            colored::control::set_override(false);
        }
        Self { json }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {}", "✓".green().bold(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    /// Print a JSON value on one line
    pub fn json(&self, value: &serde_json::Value) -> Result<()> {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    }

    /// Print any serialisable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
