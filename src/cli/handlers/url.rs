//! Handler for the `url` commands

use crate::browser::{self, ProgramData};
use crate::cli::{OutputFormatter, UrlCommands};
use crate::command::CommandRunner;
use crate::config::Settings;
use crate::error::Result;
use crate::here;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct UrlParts {
    url: String,
    without_revision: String,
    revision: String,
    repository: Option<String>,
    repo_path: Option<String>,
    branch: Option<String>,
    ancestors: Vec<String>,
}

pub fn handle_url_command(
    command: UrlCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    match command {
        UrlCommands::Inspect { url } => inspect(&url, output),
        UrlCommands::Browser {
            path,
            caller,
            admin_branch,
        } => {
            let link = browser::browser_url(
                &settings.project.base_url,
                path.as_deref(),
                caller.as_deref(),
                admin_branch.as_deref(),
            );
            if output.is_json() {
                output.print_json(&serde_json::json!({ "url": link }))
            } else {
                output.info(&link);
                Ok(())
            }
        },
        UrlCommands::Exists { url } => {
            let full_url = if url.contains("://") {
                url.clone()
            } else {
                browser::repository_url(
                    &ProgramData::from_base_url(&settings.project.base_url).base_path,
                    &url,
                    browser::repository_name(&url).is_some(),
                )
            };
            let exists = CommandRunner::new(settings.command.clone()).exists_in_repo(&full_url, here!());
            if output.is_json() {
                output.print_json(&serde_json::json!({ "url": full_url, "exists": exists }))
            } else {
                if exists {
                    output.success(&format!("{full_url} exists"));
                } else {
                    output.warning(&format!("{full_url} not found"));
                }
                Ok(())
            }
        },
    }
}

fn inspect(url: &str, output: &OutputFormatter) -> Result<()> {
    let without_revision = browser::strip_revision(url);
    let parts = UrlParts {
        url: url.to_string(),
        revision: browser::revision(url),
        repository: browser::repository_name(&without_revision),
        repo_path: browser::repo_path(&without_revision),
        branch: browser::branch_of(&without_revision),
        ancestors: browser::ancestor_paths(&without_revision),
        without_revision,
    };

    if output.is_json() {
        return output.print_json(&parts);
    }
    output.info(&format!("Path: {}", parts.without_revision));
    output.info(&format!(
        "Revision: {}",
        if parts.revision.is_empty() { "HEAD" } else { &parts.revision }
    ));
    if let Some(repository) = &parts.repository {
        output.info(&format!("Repository: {repository}"));
    }
    if let Some(repo_path) = &parts.repo_path {
        output.info(&format!("Repository path: {repo_path}"));
    }
    if let Some(branch) = &parts.branch {
        output.info(&format!("Branch: {branch}"));
    }
    Ok(())
}
