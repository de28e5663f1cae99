//! Handler for the `skills` commands

use super::program_data;
use crate::cli::{OutputFormatter, SkillsCommands};
use crate::config::Settings;
use crate::error::Result;
use crate::skills;

pub fn handle_skills_command(
    command: SkillsCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    let project = &settings.project;
    match command {
        SkillsCommands::Milestone { skill } => {
            let list = skills::milestone_skills(&project.milestone_filter, &project.skill_options, &skill)?;
            print_list(output, &skill, &list)
        },
        SkillsCommands::Ticket { skill } => {
            let list = skills::ticket_skills(&project.milestone_filter, &skill)?;
            print_list(output, &skill, &list)
        },
        SkillsCommands::Of { name } => {
            let program = program_data(settings)?;
            let skill = skills::skill_of(
                &name,
                &program.program_name,
                &project.skill_options,
                &project.default_skill,
            );
            let unmanaged = skills::is_unmanaged(&name, &program.program_name, &project.unmanaged_skills);
            if output.is_json() {
                output.print_json(&serde_json::json!({
                    "name": name,
                    "skill": skill,
                    "unmanaged": unmanaged,
                }))
            } else {
                output.info(&skill);
                if unmanaged {
                    output.info("(not under configuration management)");
                }
                Ok(())
            }
        },
    }
}

fn print_list(output: &OutputFormatter, skill: &str, list: &[String]) -> Result<()> {
    if output.is_json() {
        output.print_json(&serde_json::json!({ "skill": skill, "skills": list }))
    } else {
        output.info(&list.join(", "));
        Ok(())
    }
}
