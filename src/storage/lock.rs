//! Two-level exclusive lock for small shared files
//!
//! Threads of one process serialize on an in-process table keyed by the
//! lock path; processes serialize on an advisory `flock` held on a sidecar
//! `<file>.lock`. The advisory lock alone is not enough because it is owned
//! per open file description, which threads of a process do not share.

use crate::error::Result;
use fs2::FileExt;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};

static HELD: Lazy<(Mutex<HashSet<PathBuf>>, Condvar)> =
    Lazy::new(|| (Mutex::new(HashSet::new()), Condvar::new()));

/// Path of the sidecar lock file guarding `target`
pub fn lock_path_for(target: &Path) -> PathBuf {
    with_suffix(target, ".lock")
}

/// Scratch file a new version of `target` is written to before the rename
pub fn tmp_path_for(target: &Path) -> PathBuf {
    with_suffix(target, ".tmp")
}

fn with_suffix(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map_or_else(OsString::new, |n| n.to_os_string());
    name.push(suffix);
    target.with_file_name(name)
}

/// Guard holding both lock levels; released on drop
#[derive(Debug)]
pub struct FileLock {
    key: PathBuf,
    file: File,
}

impl FileLock {
    /// Block until `target` is exclusively ours
    pub fn acquire(target: &Path) -> Result<Self> {
        let lock_path = lock_path_for(target);
        let key = std::path::absolute(&lock_path).unwrap_or_else(|_| lock_path.clone());

        acquire_in_process(&key);
        match open_locked(&lock_path) {
            Ok(file) => {
                tracing::trace!("Locked {}", lock_path.display());
                Ok(Self { key, file })
            },
            Err(e) => {
                release_in_process(&key);
                Err(e.into())
            },
        }
    }

    /// Path of the sidecar file
    pub fn path(&self) -> &Path {
        &self.key
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {}", self.key.display(), e);
        }
        release_in_process(&self.key);
    }
}

fn acquire_in_process(key: &Path) {
    let (held, available) = &*HELD;
    let mut held = held.lock().unwrap_or_else(PoisonError::into_inner);
    while held.contains(key) {
        held = available
            .wait(held)
            .unwrap_or_else(PoisonError::into_inner);
    }
    held.insert(key.to_path_buf());
}

fn release_in_process(key: &Path) {
    let (held, available) = &*HELD;
    let mut held = held.lock().unwrap_or_else(PoisonError::into_inner);
    held.remove(key);
    available.notify_all();
}

fn open_locked(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    FileExt::lock_exclusive(&file)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_appends_suffix() {
        let path = lock_path_for(Path::new("/srv/trac/E05058/tickets/EFR/EFRnb"));
        assert_eq!(path, PathBuf::from("/srv/trac/E05058/tickets/EFR/EFRnb.lock"));
    }

    #[test]
    fn test_tmp_path_keeps_existing_extension() {
        assert_eq!(
            tmp_path_for(Path::new("/srv/trac/E05058/display-names.conf")),
            PathBuf::from("/srv/trac/E05058/display-names.conf.tmp")
        );
        assert_ne!(tmp_path_for(Path::new("a.x")), tmp_path_for(Path::new("a.y")));
    }

    #[test]
    fn test_lock_creates_sidecar_and_parents() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("counter");

        let lock = FileLock::acquire(&target).unwrap();
        assert!(lock.path().ends_with("counter.lock"));
        assert!(temp_dir.path().join("nested").join("counter.lock").exists());
    }

    #[test]
    fn test_lock_is_reacquirable_after_drop() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("counter");

        drop(FileLock::acquire(&target).unwrap());
        drop(FileLock::acquire(&target).unwrap());
    }

    #[test]
    fn test_threads_are_mutually_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let target = Arc::new(temp_dir.path().join("counter"));
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let target = Arc::clone(&target);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..5 {
                        let _lock = FileLock::acquire(&target).unwrap();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        thread::sleep(Duration::from_millis(1));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
