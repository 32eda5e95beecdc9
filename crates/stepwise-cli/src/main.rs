//! Stepwise CLI application
//!
//! Command-line front end for the Stepwise application wizard.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::{info, warn};
use renderer::TerminalRenderer;
use stepwise_core::SessionBuilder;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        namespace,
        no_color,
        command,
    } = Args::parse();

    let mut builder = SessionBuilder::new().with_store_path(database_file);
    if let Some(namespace) = namespace {
        builder = builder.with_namespace(namespace);
    }
    let session = builder.build().await.context("Failed to open session")?;

    let loaded = session.resume().await;
    if let Some(error) = &loaded.error {
        warn!("Starting from a fresh application: {error}");
    }

    info!("Stepwise started");
    let cli = Cli::new(session, TerminalRenderer::new(!no_color));

    match command {
        Some(Steps) | None => cli.list_steps().await,
        Some(Status) => cli.show_status().await,
        Some(Set(args)) => cli.set_field(&args).await,
        Some(Next) => cli.next_step().await,
        Some(Back) => cli.previous_step().await,
        Some(Goto(args)) => cli.goto_step(&args).await,
        Some(Validate) => cli.validate().await,
        Some(Save) => cli.save().await,
        Some(Draft { command }) => cli.handle_draft_command(command).await,
        Some(Support { command }) => cli.handle_support_command(command).await,
    }
}
