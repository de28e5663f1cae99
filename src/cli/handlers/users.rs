//! Handler for the `users` commands

use super::directory_resolver;
use crate::cli::{OutputFormatter, UsersCommands};
use crate::config::Settings;
use crate::directory::{DisplayNameCache, resolve_email};
use crate::error::Result;
use crate::users::{formatted_name, read_htpasswd};

pub fn handle_users_command(
    command: UsersCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    let directory = &settings.directory;
    match command {
        UsersCommands::List => {
            let users = read_htpasswd(&directory.htpasswd_file, &directory.htpasswd_special_users)?;
            if output.is_json() {
                return output.print_json(&users);
            }
            for user in &users {
                output.info(&format!("{user:<24} {}", formatted_name(user)));
            }
            Ok(())
        },
        UsersCommands::DisplayNames { regenerate } => {
            let resolver = directory_resolver(settings)?;
            let cache = DisplayNameCache::from_settings(directory);
            if regenerate {
                let count = cache.regenerate(&resolver, &directory.specified_emails)?;
                output.success(&format!("Regenerated {count} display names"));
            }
            let names = cache.names(&resolver, &directory.specified_emails)?;
            if output.is_json() {
                return output.print_json(&names);
            }
            for (username, display_name) in &names {
                output.info(&format!("{username:<24} {display_name}"));
            }
            Ok(())
        },
        UsersCommands::Email { user } => {
            let resolver = directory_resolver(settings)?;
            let email = resolve_email(&resolver, &directory.specified_emails, &user)?;
            if output.is_json() {
                return output.print_json(&serde_json::json!({ "user": user, "email": email }));
            }
            match email {
                Some(email) => output.info(&email),
                None => output.warning(&format!("No email address for '{user}'")),
            }
            Ok(())
        },
    }
}
