//! Command-line interface
//!
//! Argument definitions live in [`commands`], output formatting in
//! [`output`] and the per-command logic in [`handlers`].

mod commands;
pub mod handlers;
mod output;

pub use commands::{
    ChronoArgs, ChronoCommands, Cli, Commands, ConfigCommands, CounterCommands, NotifyCommands,
    SkillsCommands, UrlCommands, UsersCommands,
};
pub use output::OutputFormatter;
