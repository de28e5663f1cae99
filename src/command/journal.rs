//! Where command executions are reported
//!
//! Failed commands are always journaled; successful ones only at
//! [`Verbosity::Info`](super::Verbosity::Info). Each entry carries the
//! process and thread identifiers plus the call-site location, so that
//! entries from concurrent requests can be told apart in the system log.

use crate::logging::thread_label;
use std::sync::{Mutex, PoisonError};

/// Nature of a journal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalKind {
    Succeeded,
    Failed,
    /// The shell could not be started; carries the OS error
    SpawnFailed(String),
}

/// One reported command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub kind: JournalKind,
    pub command: String,
    pub code: i32,
    pub lines: Vec<String>,
    pub location: String,
    pub pid: u32,
    pub thread: String,
}

impl JournalEntry {
    pub fn new(kind: JournalKind, command: &str, code: i32, lines: &[String], location: &str) -> Self {
        Self {
            kind,
            command: command.to_string(),
            code,
            lines: lines.to_vec(),
            location: location.to_string(),
            pid: std::process::id(),
            thread: thread_label(),
        }
    }
}

/// Sink for [`JournalEntry`]s
pub trait CommandJournal: Send + Sync {
    fn record(&self, entry: &JournalEntry);
}

/// Journal writing to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJournal;

impl CommandJournal for TracingJournal {
    fn record(&self, entry: &JournalEntry) {
        match &entry.kind {
            JournalKind::SpawnFailed(error) => {
                tracing::error!(
                    pid = entry.pid,
                    thread = %entry.thread,
                    location = %entry.location,
                    "Execution failed: {} ({})",
                    error,
                    entry.command
                );
            },
            JournalKind::Failed => {
                tracing::error!(
                    pid = entry.pid,
                    thread = %entry.thread,
                    location = %entry.location,
                    code = entry.code,
                    "The following command failed:\n    {}{}",
                    entry.command,
                    format_output(&entry.lines)
                );
            },
            JournalKind::Succeeded => {
                tracing::info!(
                    pid = entry.pid,
                    thread = %entry.thread,
                    location = %entry.location,
                    code = entry.code,
                    "The following command succeeded:\n    {}{}",
                    entry.command,
                    format_output(&entry.lines)
                );
            },
        }
    }
}

fn format_output(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut text = String::from("\nwith the following output:");
    for line in lines {
        text.push_str("\n    ");
        text.push_str(line);
    }
    text
}

/// Journal keeping entries in memory
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandJournal for MemoryJournal {
    fn record(&self, entry: &JournalEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_block_lists_each_line() {
        let text = format_output(&["a".to_string(), "b".to_string()]);
        assert_eq!(text, "\nwith the following output:\n    a\n    b");
        assert_eq!(format_output(&[]), "");
    }

    #[test]
    fn test_entry_captures_process_identity() {
        let entry = JournalEntry::new(JournalKind::Failed, "false", 1, &[], "x.rs:1");
        assert_eq!(entry.pid, std::process::id());
        assert!(!entry.thread.is_empty());
    }

    #[test]
    fn test_memory_journal_keeps_order() {
        let journal = MemoryJournal::default();
        journal.record(&JournalEntry::new(JournalKind::Failed, "one", 1, &[], "a"));
        journal.record(&JournalEntry::new(JournalKind::Succeeded, "two", 0, &[], "b"));

        let commands: Vec<_> = journal.entries().into_iter().map(|e| e.command).collect();
        assert_eq!(commands, vec!["one", "two"]);
    }
}
