//! Handler for the `chrono` commands

use super::program_data;
use crate::cli::{ChronoArgs, ChronoCommands, OutputFormatter};
use crate::config::Settings;
use crate::error::Result;
use crate::numbering::{self, ChronoTicket};
use chrono::Local;

pub fn handle_chrono_command(
    command: ChronoCommands,
    settings: &Settings,
    output: &OutputFormatter,
) -> Result<()> {
    let today = Local::now().date_naive();
    match command {
        ChronoCommands::Next { ticket } => {
            let (env_name, ticket) = chrono_ticket(&ticket, settings)?;
            let (number, summary) =
                numbering::allocate_summary(&ticket, &settings.numbering.root, &env_name, &today)?;
            if output.is_json() {
                output.print_json(&serde_json::json!({
                    "kind": ticket.kind,
                    "number": number,
                    "summary": summary,
                }))
            } else {
                output.success(&summary);
                Ok(())
            }
        },
        ChronoCommands::Release { ticket, summary } => {
            let (env_name, ticket) = chrono_ticket(&ticket, settings)?;
            let current = numbering::release_summary(
                &ticket,
                &summary,
                &settings.numbering.root,
                &env_name,
                &today,
            )?;
            if output.is_json() {
                return output.print_json(&serde_json::json!({
                    "summary": summary,
                    "current": current,
                }));
            }
            match current {
                Some(current) => output.info(&format!("Counter at {current}")),
                None => output.warning(&format!("{summary} carries no chronological number")),
            }
            Ok(())
        },
    }
}

fn chrono_ticket(args: &ChronoArgs, settings: &Settings) -> Result<(String, ChronoTicket)> {
    let program = program_data(settings)?;
    let env_name = args.env.clone().unwrap_or(program.env_name);
    let skill = args
        .skill
        .clone()
        .unwrap_or_else(|| settings.project.default_skill.clone());
    let sys_skill = settings.project.skills().iter().any(|s| s == "SYS");
    let ticket = ChronoTicket::new(args.kind, program.program_name, skill).with_sys_skill(sys_skill);
    Ok((env_name, ticket))
}
