//! Error types for artus-util
//!
//! Errors fall into the families the plugin has always distinguished:
//! configuration errors and resource (validation) errors are shown to the
//! user as-is, command failures carry the exit code and captured output of
//! the last command, and everything else wraps lower-level I/O or parse
//! failures. Directory and reporting lookups that find nothing are *not*
//! errors; they surface as `None` or empty collections.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ArtusError>;

/// Main error type for artus-util
#[derive(Error, Debug)]
pub enum ArtusError {
    /// Missing or invalid setting, or an unresolvable skill/milestone mapping
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected upload or other user-supplied resource
    #[error("{0}")]
    Resource(String),

    /// An external command failed and could not be recovered
    #[error("Command failed with exit code {code}: {output}")]
    CommandFailed { code: i32, output: String },

    /// Directory service failure (connection, protocol), not a lookup miss
    #[error("Directory error: {0}")]
    Directory(String),

    /// Notification template could not be rendered
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Mail transport refused the message
    #[error("Mail delivery failed: {0}")]
    Mail(String),

    /// Reporting database failure
    #[error("Reporting database error: {0}")]
    Reporting(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl ArtusError {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Message suitable for end users
    ///
    /// Configuration errors are deliberately vague towards the user; the
    /// detailed reason is logged where the error is raised.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "Configuration error. Please contact the TRAC admin.".to_string(),
            Self::CommandFailed { code, .. } => {
                format!("External command failed (exit code {code})")
            },
            _ => self.to_string(),
        }
    }

    /// Hints for fixing the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(_) => vec![
                "Check the settings file (artus-util config show)".to_string(),
                "Verify 'milestone_filter' and 'skill_options' are consistent".to_string(),
            ],
            Self::Resource(_) => vec!["Select a non-empty file with the expected extension".to_string()],
            Self::CommandFailed { .. } => vec![
                "Run the command again with --verbose to see the full output".to_string(),
                "A stale working copy may need 'svn cleanup'".to_string(),
            ],
            Self::Io(_) => vec!["Check file permissions and available disk space".to_string()],
            _ => Vec::new(),
        }
    }

    /// Whether retrying the operation might succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::CommandFailed { .. } | Self::Io(_) | Self::Mail(_))
    }

    /// Whether this is a configuration problem
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<config::ConfigError> for ArtusError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<csv::Error> for ArtusError {
    fn from(err: csv::Error) -> Self {
        Self::parse("CSV data", err)
    }
}
