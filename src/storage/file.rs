use super::lock::{FileLock, tmp_path_for};
use crate::error::Result;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Ticket-number counter persisted as a single decimal integer
///
/// The file holds the last issued number. Every read-modify-write happens
/// under a [`FileLock`] and the new value replaces the file atomically.
#[derive(Debug, Clone)]
pub struct FileCounter {
    path: PathBuf,
}

impl FileCounter {
    /// Create a counter backed by `path`; nothing is touched until first use
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the counter file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issue the next number
    pub fn allocate_number(&self) -> Result<u64> {
        let _lock = FileLock::acquire(&self.path)?;
        let number = self.read_value().saturating_add(1);
        self.write_value(number)?;
        tracing::debug!("Allocated number {} from {}", number, self.path.display());
        Ok(number)
    }

    /// Roll back `number` if it is the last one issued
    ///
    /// Any other number leaves the counter unchanged; the returned value is
    /// what the file holds afterwards.
    pub fn deallocate_number(&self, number: u64) -> Result<u64> {
        let _lock = FileLock::acquire(&self.path)?;
        let current = self.read_value();
        if number != current {
            tracing::debug!(
                "Not releasing {} from {}: last issued is {}",
                number,
                self.path.display(),
                current
            );
            return Ok(current);
        }

        let value = current.saturating_sub(1);
        self.write_value(value)?;
        tracing::debug!("Released number {} from {}", number, self.path.display());
        Ok(value)
    }

    /// Last issued number without modifying anything
    pub fn current_number(&self) -> Result<u64> {
        let _lock = FileLock::acquire(&self.path)?;
        Ok(self.read_value())
    }

    /// Missing, unreadable or corrupt content all read as zero
    fn read_value(&self) -> u64 {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!("Cannot read counter {}: {}", self.path.display(), e);
                return 0;
            },
        };

        let line = content.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return 0;
        }
        line.parse().unwrap_or_else(|e| {
            tracing::warn!(
                "Corrupt counter {} ({:?}: {}), restarting from zero",
                self.path.display(),
                line,
                e
            );
            0
        })
    }

    fn write_value(&self, value: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = tmp_path_for(&self.path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.to_string().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
