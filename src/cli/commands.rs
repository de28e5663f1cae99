//! Command-line definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::command::Verbosity;
use crate::numbering::ChronoKind;

/// Ticket numbering, Subversion command execution and directory helpers
#[derive(Parser, Debug)]
#[command(name = "artus-util")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the per-user settings.yaml)
    #[arg(short, long, global = true, env = "ARTUS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Raw ticket-number counters
    Counter {
        #[command(subcommand)]
        command: CounterCommands,
    },

    /// Chronologically numbered tickets (ECR, RISK, MOM, ...)
    Chrono {
        #[command(subcommand)]
        command: ChronoCommands,
    },

    /// Run a batch of shell commands with fault recovery
    Exec {
        /// Commands, run in order until one fails
        #[arg(required = true)]
        commands: Vec<String>,

        /// Journal every command, not only failures
        #[arg(long, value_parser = clap::value_parser!(Verbosity))]
        verbosity: Option<Verbosity>,

        /// Working directory (overrides settings)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Inspect repository browser URLs
    Url {
        #[command(subcommand)]
        command: UrlCommands,
    },

    /// Skill configuration lookups
    Skills {
        #[command(subcommand)]
        command: SkillsCommands,
    },

    /// Validate an uploaded project file
    Upload {
        /// File to check
        file: PathBuf,

        /// Expected extension
        #[arg(long, default_value = "rqtf")]
        ext: String,
    },

    /// Registered users and directory lookups
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },

    /// Mail notifications
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },

    /// Settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CounterCommands {
    /// Allocate the next number
    Next {
        /// Counter file
        path: PathBuf,
    },

    /// Give back a number (only the last issued one is taken back)
    Release {
        path: PathBuf,
        number: u64,
    },

    /// Show the last issued number
    Show {
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChronoCommands {
    /// Allocate a number and print the ticket summary
    Next {
        #[command(flatten)]
        ticket: ChronoArgs,
    },

    /// Give back the number of a deleted ticket
    Release {
        #[command(flatten)]
        ticket: ChronoArgs,

        /// Summary of the deleted ticket
        summary: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct ChronoArgs {
    /// Ticket type (EFR, ECR, RISK, AI, MEMO, ECM, MOM-REVIEW, MOM-AUDIT)
    #[arg(long, value_parser = clap::value_parser!(ChronoKind))]
    pub kind: ChronoKind,

    /// Skill of the ticket
    #[arg(long)]
    pub skill: Option<String>,

    /// Environment name (derived from the base URL by default)
    #[arg(long)]
    pub env: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UrlCommands {
    /// Break a browser URL into its parts
    Inspect {
        url: String,
    },

    /// Browser URL of a repository path
    Browser {
        /// Repository path, e.g. /trunk/doc?rev=12
        path: Option<String>,

        #[arg(long)]
        caller: Option<String>,

        #[arg(long)]
        admin_branch: Option<String>,
    },

    /// Check that a repository URL exists
    Exists {
        url: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SkillsCommands {
    /// Milestone skills compatible with a ticket skill
    Milestone {
        skill: String,
    },

    /// Ticket skills compatible with a milestone skill
    Ticket {
        skill: String,
    },

    /// Skill embedded in an item name
    Of {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// Registered users of the htpasswd file
    List,

    /// Display names of registered users (cached)
    DisplayNames {
        /// Rebuild the cache even if it is up to date
        #[arg(long)]
        regenerate: bool,
    },

    /// Email address of a user
    Email {
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Tell a user their PDF printing job completed
    PdfJob {
        /// Job directory, `<...>/<env>/<job>`
        base_path: PathBuf,

        /// Requesting user
        #[arg(long)]
        user: String,

        /// Print the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,

    /// Print the default settings file location
    Path,
}
