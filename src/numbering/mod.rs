//! Ticket-number allocation
//!
//! [`allocate`] and [`deallocate`] are the entry points used when a ticket
//! is created or deleted. The counter file holds the last issued number;
//! only that number can be handed back.

mod chrono_id;

pub use chrono_id::{ChronoKind, ChronoTicket, chrono_number};

use crate::error::Result;
use crate::storage::{FileCounter, NumberRepository};
use chrono::Datelike;
use std::path::Path;

/// Issue the next number from the counter at `counter_path`
pub fn allocate(counter_path: &Path) -> Result<u64> {
    FileCounter::new(counter_path).allocate()
}

/// Hand `number` back to the counter at `counter_path`
///
/// Only the most recently issued number is taken back; for anything else
/// the counter is left alone. Returns the value the counter holds afterwards.
pub fn deallocate(counter_path: &Path, number: u64) -> Result<u64> {
    FileCounter::new(counter_path).deallocate(number)
}

/// Last number issued by the counter at `counter_path`, without changing it
pub fn current(counter_path: &Path) -> Result<u64> {
    FileCounter::new(counter_path).current()
}

/// Allocate a number for `ticket` and build its summary
pub fn allocate_summary(
    ticket: &ChronoTicket,
    root: &Path,
    env_name: &str,
    today: &impl Datelike,
) -> Result<(u64, String)> {
    let path = ticket.counter_path(root, env_name, today);
    let number = allocate(&path)?;
    let summary = ticket.summary(number, today);
    tracing::info!("{}: allocated {} ({})", env_name, summary, path.display());
    Ok((number, summary))
}

/// Give back the number carried by `summary` when a ticket is deleted
///
/// Returns `None` when the summary carries no number, otherwise the
/// counter value after the rollback attempt.
pub fn release_summary(
    ticket: &ChronoTicket,
    summary: &str,
    root: &Path,
    env_name: &str,
    today: &impl Datelike,
) -> Result<Option<u64>> {
    let Some(number) = chrono_number(ticket.kind, summary) else {
        tracing::debug!("{}: no chronological number in {}", env_name, summary);
        return Ok(None);
    };
    let path = ticket.counter_path(root, env_name, today);
    deallocate(&path, number).map(Some)
}
