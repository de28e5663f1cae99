//! External command execution
//!
//! The plugin drives the `svn` command-line client (and a few archive
//! tools) through the shell. [`CommandRunner`] runs batches of commands,
//! journals what happened and recovers from the two working-copy faults the
//! client is known to leave behind.

mod fault;
mod journal;
mod runner;
pub mod svn;

pub use fault::{Fault, FaultClassifier};
pub use journal::{CommandJournal, JournalEntry, JournalKind, MemoryJournal, TracingJournal};
pub use runner::CommandRunner;

use crate::error::ArtusError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static SILENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&>\s*/dev/null|>\s*/dev/null\s+2>&1").expect("valid regex"));

/// Which executions are journaled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Failures only
    #[default]
    Error,
    /// Every command
    Info,
}

impl FromStr for Verbosity {
    type Err = ArtusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" | "warning" | "warn" => Ok(Self::Error),
            "info" | "debug" => Ok(Self::Info),
            _ => Err(ArtusError::InvalidInput(format!("Unknown verbosity: {s}"))),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Info => f.write_str("info"),
        }
    }
}

/// Exit code and merged output of the last attempted command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub code: i32,
    pub lines: Vec<String>,
}

impl CommandOutcome {
    /// Outcome reported when the shell could not be started
    pub const fn spawn_failure() -> Self {
        Self {
            code: -1,
            lines: Vec::new(),
        }
    }

    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Whether `command` discards its own output (`&> /dev/null`)
///
/// Such commands are existence probes: their output is neither captured
/// nor journaled.
pub fn is_silenced(command: &str) -> bool {
    SILENCE_MARKER.is_match(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_markers() {
        assert!(is_silenced("svn info \"x\" &> /dev/null"));
        assert!(is_silenced("find /x -name t1 -exec rm -Rf {} \\; &>/dev/null"));
        assert!(is_silenced("ls > /dev/null 2>&1"));
        assert!(!is_silenced("svn info \"x\""));
        assert!(!is_silenced("ls > /dev/null"));
    }

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("INFO".parse::<Verbosity>().unwrap(), Verbosity::Info);
        assert_eq!("error".parse::<Verbosity>().unwrap(), Verbosity::Error);
        assert!("loud".parse::<Verbosity>().is_err());
    }

    #[test]
    fn test_spawn_failure_outcome() {
        let outcome = CommandOutcome::spawn_failure();
        assert_eq!(outcome.code, -1);
        assert!(!outcome.success());
        assert!(outcome.lines.is_empty());
    }
}
