use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{DraftCommands, GotoArgs, SetArgs, SupportCommands};

/// Command-line front end for the Stepwise application wizard
///
/// Walks a multi-step licence application one step at a time. Each
/// invocation resumes the saved draft, applies the command and saves the
/// result again, so the application can be filled in across many runs.
#[derive(Parser)]
#[command(version, about, name = "stepwise")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/stepwise/drafts.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Storage namespace, one per application
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Stepwise CLI
#[derive(Subcommand)]
pub enum Commands {
    /// List the steps that apply to the current answers
    #[command(alias = "ls")]
    Steps,
    /// Show the current step, progress and save state
    #[command(alias = "st")]
    Status,
    /// Set a form field
    Set(SetArgs),
    /// Validate the current step and move forward
    #[command(alias = "n")]
    Next,
    /// Move back one step
    #[command(alias = "b")]
    Back,
    /// Jump to a step by position or id
    #[command(alias = "g")]
    Goto(GotoArgs),
    /// Validate the current step without moving
    Validate,
    /// Save the draft
    Save,
    /// Inspect or discard the saved draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },
    /// Contact support
    Support {
        #[command(subcommand)]
        command: SupportCommands,
    },
}
