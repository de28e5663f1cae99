use super::DirectoryService;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One exported directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub user_id: String,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Directory backed by a CSV export (`user_id,mail,display_name`)
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: HashMap<String, DirectoryRecord>,
}

impl StaticDirectory {
    pub fn new(records: impl IntoIterator<Item = DirectoryRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.user_id.clone(), record))
                .collect(),
        }
    }

    /// Load an export; a missing file is an empty directory
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Directory export {} not found", path.display());
            return Ok(Self::default());
        }
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize::<DirectoryRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        tracing::debug!("Loaded {} directory entries from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DirectoryService for StaticDirectory {
    fn mail(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.records.get(user_id).and_then(|r| r.mail.clone()))
    }

    fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.records.get(user_id).and_then(|r| r.display_name.clone()))
    }

    fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.records.contains_key(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_csv_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corporate.csv");
        std::fs::write(
            &path,
            "user_id,mail,display_name\njohn.doe,john.doe@corp.com,Doe John\njane.roe,,\n",
        )
        .unwrap();

        let directory = StaticDirectory::load(&path).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.mail("john.doe").unwrap().as_deref(), Some("john.doe@corp.com"));
        assert_eq!(directory.display_name("john.doe").unwrap().as_deref(), Some("Doe John"));
        assert!(directory.exists("jane.roe").unwrap());
        assert_eq!(directory.mail("jane.roe").unwrap(), None);
        assert!(!directory.exists("ghost").unwrap());
    }

    #[test]
    fn test_missing_export_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let directory = StaticDirectory::load(&temp_dir.path().join("absent.csv")).unwrap();
        assert!(directory.is_empty());
    }
}
