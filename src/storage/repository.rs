use crate::error::Result;

/// Repository trait for ticket-number counters
///
/// A counter issues strictly increasing numbers and can only take back the
/// most recently issued one.
pub trait NumberRepository: Send + Sync {
    /// Issues the next number
    fn allocate(&self) -> Result<u64>;

    /// Takes `number` back if it was the last issued; returns the resulting value
    fn deallocate(&self, number: u64) -> Result<u64>;

    /// Returns the last issued number (0 when nothing was issued)
    fn current(&self) -> Result<u64>;
}

use super::file::FileCounter;

impl NumberRepository for FileCounter {
    fn allocate(&self) -> Result<u64> {
        self.allocate_number()
    }

    fn deallocate(&self, number: u64) -> Result<u64> {
        self.deallocate_number(number)
    }

    fn current(&self) -> Result<u64> {
        self.current_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_counter(temp_dir: &TempDir, name: &str) -> FileCounter {
        FileCounter::new(temp_dir.path().join("tickets").join(name))
    }

    #[test]
    fn test_number_repository_allocate_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let counter = create_test_counter(&temp_dir, "EFRnb");

        assert_eq!(counter.allocate().expect("Failed to allocate"), 1);
        assert_eq!(counter.allocate().expect("Failed to allocate"), 2);
        assert_eq!(counter.current().expect("Failed to read"), 2);
    }

    #[test]
    fn test_number_repository_deallocate_last() {
        let temp_dir = TempDir::new().unwrap();
        let counter = create_test_counter(&temp_dir, "ECRnb");

        counter.allocate().expect("Failed to allocate");
        let last = counter.allocate().expect("Failed to allocate");

        assert_eq!(counter.deallocate(last).expect("Failed to deallocate"), 1);
        assert_eq!(counter.current().expect("Failed to read"), 1);
    }

    #[test]
    fn test_number_repository_deallocate_other_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let counter = create_test_counter(&temp_dir, "MEMOnb");

        for _ in 0..3 {
            counter.allocate().expect("Failed to allocate");
        }

        assert_eq!(counter.deallocate(1).expect("Failed to deallocate"), 3);
        assert_eq!(counter.deallocate(7).expect("Failed to deallocate"), 3);
        assert_eq!(counter.current().expect("Failed to read"), 3);
    }
}
