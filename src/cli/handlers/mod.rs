//! Command handlers
//!
//! Each handler takes its parsed arguments, the effective settings and the
//! output formatter, and prints either text or JSON.

mod chrono_ticket;
mod config;
mod counter;
mod exec;
mod notify;
mod skills;
mod upload;
mod url;
mod users;

pub use self::chrono_ticket::handle_chrono_command;
pub use self::config::handle_config_command;
pub use self::counter::handle_counter_command;
pub use self::exec::handle_exec;
pub use self::notify::handle_notify_command;
pub use self::skills::handle_skills_command;
pub use self::upload::handle_upload;
pub use self::url::handle_url_command;
pub use self::users::handle_users_command;

use crate::browser::ProgramData;
use crate::config::Settings;
use crate::directory::{DirectoryResolver, StaticDirectory, Translations};
use crate::error::{ArtusError, Result};

/// Environment and program names of the configured base URL
pub(crate) fn program_data(settings: &Settings) -> Result<ProgramData> {
    if settings.project.base_url.is_empty() {
        tracing::error!("project.base_url is not set");
        return Err(ArtusError::config("project.base_url is not set"));
    }
    Ok(ProgramData::from_base_url(&settings.project.base_url))
}

/// Resolver over the directory exports named in the settings
pub(crate) fn directory_resolver(settings: &Settings) -> Result<DirectoryResolver> {
    let directory = &settings.directory;
    Ok(DirectoryResolver::new(
        Box::new(StaticDirectory::load(&directory.corporate_directory_file)?),
        Box::new(StaticDirectory::load(&directory.legacy_directory_file)?),
        Translations::load(&directory.translation_file)?,
    ))
}
