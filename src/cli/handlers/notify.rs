//! Handler for the `notify` commands

use super::directory_resolver;
use crate::cli::{NotifyCommands, OutputFormatter};
use crate::config::Settings;
use crate::directory::DisplayNameCache;
use crate::error::Result;
use crate::notify::{Address, PdfJobNotice, SendmailTransport};
use std::collections::HashMap;

pub fn handle_notify_command(
    command: NotifyCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    match command {
        NotifyCommands::PdfJob {
            base_path,
            user,
            dry_run,
        } => {
            let directory = &settings.directory;
            let resolver = directory_resolver(settings)?;
            let store = &directory.specified_emails;
            let display_names: HashMap<String, String> = DisplayNameCache::from_settings(directory)
                .names(&resolver, store)?
                .into_iter()
                .collect();

            let admin_login = settings
                .project
                .project_admin
                .split('@')
                .next()
                .unwrap_or_default();
            let requester = Address::of_user(&user, &resolver, store, &display_names)?;
            let admin = Address::of_user(admin_login, &resolver, store, &display_names)?;

            let notice = PdfJobNotice::new(settings)?;
            let message = if dry_run {
                notice.build(&base_path, &requester, &admin)?
            } else {
                notice.send(&SendmailTransport::default(), &base_path, &requester, &admin)?
            };

            if output.is_json() {
                output.print_json(&message)
            } else if dry_run {
                output.info(&message.to_rfc5322());
                Ok(())
            } else {
                output.success(&format!("Notice sent to {}", requester.email));
                Ok(())
            }
        },
    }
}
