//! Corporate and legacy user directories
//!
//! Two directories coexist: the corporate one, keyed by `forename.name`
//! identifiers, and the legacy one, keyed by short `fname` logins. Legacy
//! logins that were migrated are mapped to their corporate identifier by a
//! translation file. Lookups that find nothing are not errors.

mod display_cache;
mod resolver;
mod static_directory;
mod translation;

pub use display_cache::{DisplayNameCache, transliterate};
pub use resolver::{DirectoryResolver, DomainEmailResolver, SpecifiedEmailStore, resolve_email};
pub use static_directory::{DirectoryRecord, StaticDirectory};
pub use translation::Translations;

use crate::error::{ArtusError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Login naming convention of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginType {
    /// Legacy short logins (`jdoe`)
    #[serde(rename = "fname")]
    Fname,
    /// Corporate logins (`john.doe`)
    #[default]
    #[serde(rename = "forename.name")]
    ForenameName,
}

impl LoginType {
    /// Whether `username` follows this convention
    pub fn accepts(self, username: &str) -> bool {
        match self {
            Self::Fname => !username.contains('.'),
            Self::ForenameName => username.contains('.'),
        }
    }
}

impl FromStr for LoginType {
    type Err = ArtusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fname" => Ok(Self::Fname),
            "forename.name" => Ok(Self::ForenameName),
            _ => Err(ArtusError::InvalidInput(format!("Unknown login type: {s}"))),
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fname => f.write_str("fname"),
            Self::ForenameName => f.write_str("forename.name"),
        }
    }
}

/// A user directory
///
/// `Err` is reserved for the directory itself being unusable.
#[cfg_attr(test, mockall::automock)]
pub trait DirectoryService: Send + Sync {
    /// Email address of `user_id`
    fn mail(&self, user_id: &str) -> Result<Option<String>>;

    /// Human-readable name of `user_id`
    fn display_name(&self, user_id: &str) -> Result<Option<String>>;

    fn exists(&self, user_id: &str) -> Result<bool>;
}

/// Whether a corporate address belongs to an external contractor
pub fn is_external_address(mail: &str) -> bool {
    mail.contains(".external@")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_type_filtering() {
        assert!(LoginType::Fname.accepts("jdoe"));
        assert!(!LoginType::Fname.accepts("john.doe"));
        assert!(LoginType::ForenameName.accepts("john.doe"));
        assert!(!LoginType::ForenameName.accepts("jdoe"));
    }

    #[test]
    fn test_login_type_text_forms() {
        assert_eq!("forename.name".parse::<LoginType>().unwrap(), LoginType::ForenameName);
        assert_eq!(LoginType::Fname.to_string(), "fname");
        assert!("email".parse::<LoginType>().is_err());
        assert_eq!(serde_yaml::to_string(&LoginType::ForenameName).unwrap().trim(), "forename.name");
    }

    #[test]
    fn test_external_address() {
        assert!(is_external_address("john.doe.external@corp.com"));
        assert!(!is_external_address("john.doe@corp.com"));
    }
}
