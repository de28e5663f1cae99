use crate::error::Result;
use config::{File, FileFormat};
use std::collections::HashMap;
use std::path::Path;

const DOMAIN_SECTION: &str = "domain-translation";
const USER_SECTION: &str = "user-translation";

/// Legacy-to-corporate name tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    domains: HashMap<String, String>,
    users: HashMap<String, String>,
}

impl Translations {
    pub fn new(domains: HashMap<String, String>, users: HashMap<String, String>) -> Self {
        Self { domains, users }
    }

    /// Read the INI translation file; a missing file yields empty tables
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Translation file {} not found", path.display());
            return Ok(Self::default());
        }

        let mut sections = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?
            .try_deserialize::<HashMap<String, HashMap<String, String>>>()?;

        Ok(Self {
            domains: sections.remove(DOMAIN_SECTION).unwrap_or_default(),
            users: sections.remove(USER_SECTION).unwrap_or_default(),
        })
    }

    /// Corporate identifier of a legacy login
    pub fn user(&self, login: &str) -> Option<&str> {
        self.users.get(login).map(String::as_str)
    }

    pub fn domain(&self, domain: &str) -> Option<&str> {
        self.domains.get(domain).map(String::as_str)
    }
}
