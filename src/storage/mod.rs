//! Persisted state owned by this crate
//!
//! Only two files are shared between requests: ticket-number counters and
//! the display-name cache. Both are guarded by [`FileLock`].

mod file;
mod lock;
mod repository;

pub use file::FileCounter;
pub use lock::{FileLock, lock_path_for, tmp_path_for};
pub use repository::NumberRepository;
