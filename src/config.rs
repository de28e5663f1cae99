//! Layered settings
//!
//! Settings are assembled from built-in defaults, an optional YAML file and
//! `ARTUS_*` environment variables (nested keys separated by `__`, e.g.
//! `ARTUS_COMMAND__BACKOFF_MS=0`), in that order of precedence.

use crate::command::Verbosity;
use crate::directory::LoginType;
use crate::error::{ArtusError, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ARTUS";

/// Complete settings tree
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub project: ProjectSettings,
    pub command: CommandSettings,
    pub directory: DirectorySettings,
    pub mail: MailSettings,
    pub numbering: NumberingSettings,
}

/// Ticketing environment the plugin is attached to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectSettings {
    /// Base URL of the environment, e.g. `https://trac.example.com/tracs/E05058SB`
    pub base_url: String,
    pub scheme: String,
    pub project_name: String,
    pub project_description: String,
    /// Administrator address; its local part is used as a username
    pub project_admin: String,
    pub default_skill: String,
    /// Regex alternation of skills not under configuration management
    pub unmanaged_skills: String,
    /// `|`-separated list of known skills (empty when skills are disabled)
    pub skill_options: String,
    /// `ticket_skill -> milestone_skill[, ...] // ...`
    pub milestone_filter: String,
    /// `skill[, ...] -> shortname // ...`
    pub code_shortnames: String,
    pub user_profiles: Vec<String>,
    pub user_roles: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            scheme: "https".to_string(),
            project_name: String::new(),
            project_description: String::new(),
            project_admin: String::new(),
            default_skill: "SYS".to_string(),
            unmanaged_skills: "EXT".to_string(),
            skill_options: String::new(),
            milestone_filter: String::new(),
            code_shortnames: String::new(),
            user_profiles: Vec::new(),
            user_roles: Vec::new(),
        }
    }
}

impl ProjectSettings {
    /// Known skills, in configuration order
    pub fn skills(&self) -> Vec<String> {
        self.skill_options
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// How external commands are executed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandSettings {
    /// Shell used to interpret commands; must understand `&>`
    pub shell: PathBuf,
    pub working_dir: PathBuf,
    pub home: PathBuf,
    pub locale: String,
    pub path: String,
    pub verbosity: Verbosity,
    /// Pause before a repair, in milliseconds
    pub backoff_ms: u64,
    pub svn_user: String,
    /// Prefix shared by all ticket working copies
    pub working_copy_root: String,
    pub fetch_pristine_script: String,
    /// Archiver called as `<zip_program> -j <archive> <files>...`
    pub zip_program: String,
}

impl Default for CommandSettings {
    fn default() -> Self {
        let home = directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from("/tmp"), |dirs| dirs.home_dir().to_path_buf());
        Self {
            shell: PathBuf::from("/bin/bash"),
            working_dir: home.clone(),
            home,
            locale: "fr_FR.utf8".to_string(),
            path: "/usr/local/bin:/usr/bin:/bin".to_string(),
            verbosity: Verbosity::Error,
            backoff_ms: 1000,
            svn_user: "trac".to_string(),
            working_copy_root: "/var/cache/trac/tickets/".to_string(),
            fetch_pristine_script: "/srv/svn/common/svn-fetch-pristine-by-sha1.sh".to_string(),
            zip_program: "/usr/bin/zip".to_string(),
        }
    }
}

/// Directory service and user registry files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DirectorySettings {
    pub htpasswd_file: PathBuf,
    pub htpasswd_special_users: Vec<String>,
    pub htpasswd_test_users: Vec<String>,
    pub translation_file: PathBuf,
    pub display_names_file: PathBuf,
    pub login_type: LoginType,
    /// CSV export of the corporate directory (`user_id,mail,display_name`)
    pub corporate_directory_file: PathBuf,
    /// CSV export of the legacy directory
    pub legacy_directory_file: PathBuf,
    /// Addresses users entered themselves, by username
    pub specified_emails: HashMap<String, String>,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            htpasswd_file: PathBuf::from("/srv/svn/access_right/htpasswd"),
            htpasswd_special_users: vec!["trac".to_string()],
            htpasswd_test_users: Vec::new(),
            translation_file: PathBuf::from("/srv/svn/access_right/meggitt-translation.conf"),
            display_names_file: PathBuf::from("/srv/svn/access_right/ldap-display-names.conf"),
            login_type: LoginType::ForenameName,
            corporate_directory_file: PathBuf::from("/srv/svn/access_right/corporate-directory.csv"),
            legacy_directory_file: PathBuf::from("/srv/svn/access_right/legacy-directory.csv"),
            specified_emails: HashMap::new(),
        }
    }
}

/// Notification mail settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailSettings {
    /// Domain appended to bare usernames; empty disables the fallback
    pub smtp_default_domain: String,
    pub smtp_from: String,
    pub smtp_from_name: String,
    /// Optional HTML body template for PDF printing notices
    pub html_template: Option<PathBuf>,
}

/// Ticket-number counter location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NumberingSettings {
    pub root: PathBuf,
}

impl Default for NumberingSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/srv/trac"),
        }
    }
}

impl Settings {
    /// Default settings file location for the current user
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "artus", "artus-util")
            .map(|dirs| dirs.config_dir().join("settings.yaml"))
    }

    /// Load settings from `path` (or the default location) plus environment
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &path {
            tracing::debug!("Loading settings from {}", path.display());
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Self>()?;

        Ok(settings)
    }

    /// Load settings, falling back to defaults when they cannot be read
    pub fn load_or_default() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            tracing::warn!("Using default settings: {}", e);
            Self::default()
        })
    }

    /// Render the effective settings as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ArtusError::parse("settings", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(Some(&temp_dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(settings.project.default_skill, "SYS");
        assert_eq!(settings.command.backoff_ms, 1000);
        assert_eq!(settings.command.svn_user, "trac");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "project:\n  skill_options: \"SYS|HW|FW\"\ncommand:\n  backoff_ms: 0\n  verbosity: info\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.project.skills(), vec!["SYS", "HW", "FW"]);
        assert_eq!(settings.command.backoff_ms, 0);
        assert_eq!(settings.command.verbosity, Verbosity::Info);
        // untouched keys keep their defaults
        assert_eq!(settings.project.unmanaged_skills, "EXT");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        std::fs::write(&path, "command: [unclosed").unwrap();

        let err = Settings::load(Some(&path)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_yaml_rendering_contains_sections() {
        let yaml = Settings::default().to_yaml().unwrap();
        assert!(yaml.contains("numbering:"));
        assert!(yaml.contains("working_copy_root"));
    }
}
