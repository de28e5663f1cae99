//! artus-util - Support library of the Artus project-management plugin
//!
//! This crate provides the low-level services the plugin's ticket workflows
//! rely on:
//! - Ticket-number counters safe across threads and processes
//! - Shell command batches with journaling and recovery from the
//!   Subversion working-copy faults (missing pristine text, stale locks)
//! - Repository browser URL helpers
//! - Skill configuration lookups
//! - Directory lookups, cached display names and PDF-job notifications
//! - Read-only queries on the evolution-request reporting view

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]

//! # Concurrent Safety
//!
//! Counter updates hold a process-local lock keyed by the counter path plus
//! an advisory lock on a `<counter>.lock` sidecar file, so concurrent
//! requests, threads or processes never receive the same number. The
//! display-name cache is rebuilt under the same kind of lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use artus_util::numbering;
//!
//! let number = numbering::allocate(Path::new("/srv/trac/P/tickets/ECR/ECRSYSnb"))?;
//! // the ticket creation failed: hand the number back
//! numbering::deallocate(Path::new("/srv/trac/P/tickets/ECR/ECRSYSnb"), number)?;
//! ```

pub mod browser;
pub mod cli;
pub mod command;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod notify;
pub mod numbering;
pub mod reporting;
pub mod skills;
pub mod storage;
pub mod upload;
pub mod users;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ArtusError, Result};
