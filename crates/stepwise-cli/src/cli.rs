//! Command handlers and their clap argument types.
//!
//! Every handler works on the resumed [`Session`] and renders a markdown
//! view from `stepwise_core::display`. Commands that change the wizard save
//! the draft before printing, so the next invocation picks up where this one
//! stopped.

use std::{fmt::Write as _, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use stepwise_core::{
    display::{
        ErrorSummary, NavigationOutcome, OperationStatus, PendingOperations, SaveOutcome,
        StepList, TicketResult,
    },
    format_last_saved,
    support::{validate_files, validate_support_request, Attachment},
    Session, SupportClient, SupportRequest,
};

use crate::renderer::TerminalRenderer;

/// Arguments for setting a form field
#[derive(Args)]
pub struct SetArgs {
    /// Dot-separated field path, e.g. `firmName` or `submitterDetails.email`
    pub path: String,
    /// JSON value; anything that does not parse as JSON is stored as a string
    pub value: String,
}

impl SetArgs {
    fn parsed_value(&self) -> Value {
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::String(self.value.clone()))
    }
}

/// Arguments for jumping to a step
#[derive(Args)]
pub struct GotoArgs {
    /// Step position as listed by `steps` (1-based) or a step id
    pub target: String,
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Show what the saved draft contains
    Show,
    /// List operations waiting to be sent to the server
    Pending,
    /// Delete the saved draft and any queued operations
    Clear,
}

#[derive(Subcommand)]
pub enum SupportCommands {
    /// Submit a support ticket
    Submit(SubmitArgs),
}

/// Arguments for submitting a support ticket
#[derive(Args)]
pub struct SubmitArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub message: String,
    /// Category code: technical, billing, account, feature or other
    #[arg(long, default_value = "technical")]
    pub category: String,
    #[arg(long, default_value = "medium")]
    pub priority: String,
    /// File to attach; repeat for more than one
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
    /// Override the support endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl SubmitArgs {
    fn request(&self) -> SupportRequest {
        SupportRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            subject: self.subject.clone(),
            category: self.category.clone(),
            priority: self.priority.clone(),
            message: self.message.clone(),
            attachments: Vec::new(),
            azure_id: None,
        }
    }
}

pub struct Cli {
    session: Session,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(session: Session, renderer: TerminalRenderer) -> Self {
        Self { session, renderer }
    }

    pub async fn list_steps(&self) -> Result<()> {
        let wizard = self.session.wizard();
        let wizard = wizard.lock().await;
        self.renderer.render(&StepList(&wizard))
    }

    pub async fn show_status(&self) -> Result<()> {
        let wizard = self.session.wizard();
        let wizard = wizard.lock().await;

        let mut output = String::from("# Application status\n\n");
        if let Some(reference) = wizard.application_ref() {
            writeln!(output, "- **Reference**: {reference}")?;
        }
        match wizard.current_step() {
            Some(step) => writeln!(
                output,
                "- **Current step**: {step} ({} of {})",
                wizard.current_step_index() + 1,
                wizard.applicable_steps().len()
            )?,
            None => writeln!(output, "- **Current step**: none")?,
        }
        writeln!(output, "- **Progress**: {}%", wizard.progress_percent())?;
        writeln!(output, "- **Last saved**: {}", format_last_saved(wizard.last_saved()))?;
        writeln!(output, "- **Pending operations**: {}", self.session.queue().len())?;

        self.renderer.render(&output)
    }

    pub async fn set_field(&self, args: &SetArgs) -> Result<()> {
        self.session
            .update_field(&args.path, args.parsed_value())
            .await
            .with_context(|| format!("Failed to set {}", args.path))?;
        self.persist().await?;
        self.renderer
            .render(&OperationStatus::success(format!("Set `{}`", args.path)))
    }

    pub async fn next_step(&self) -> Result<()> {
        let wizard = self.session.wizard();
        let (output, result) = {
            let mut wizard = wizard.lock().await;
            let result = wizard.forward();
            (NavigationOutcome::new(&wizard, &result).to_string(), result)
        };

        self.persist().await?;
        self.renderer.render(&output)?;
        result?;
        Ok(())
    }

    pub async fn previous_step(&self) -> Result<()> {
        let wizard = self.session.wizard();
        let output = {
            let mut wizard = wizard.lock().await;
            match wizard.back() {
                Some(effect) => NavigationOutcome::new(&wizard, &Ok(effect)).to_string(),
                None => OperationStatus::failure("Already on the first step").to_string(),
            }
        };

        self.persist().await?;
        self.renderer.render(&output)
    }

    pub async fn goto_step(&self, args: &GotoArgs) -> Result<()> {
        let wizard = self.session.wizard();
        let (output, result) = {
            let mut wizard = wizard.lock().await;
            let result = match args.target.parse::<usize>() {
                Ok(0) => bail!("Step positions start at 1"),
                Ok(position) => wizard.jump(position - 1),
                Err(_) => wizard.jump_to_step(&args.target),
            };
            (NavigationOutcome::new(&wizard, &result).to_string(), result)
        };

        if result.is_ok() {
            self.persist().await?;
        }
        self.renderer.render(&output)?;
        result?;
        Ok(())
    }

    pub async fn validate(&self) -> Result<()> {
        let wizard = self.session.wizard();
        let wizard = wizard.lock().await;
        let step_id = wizard.current_step_id().unwrap_or("-").to_string();

        let result = wizard.validate_current();
        if result.is_valid {
            return self
                .renderer
                .render(&OperationStatus::success(format!("Step `{step_id}` is complete")));
        }

        self.renderer.render(&ErrorSummary(&result.errors))?;
        bail!("Step '{step_id}' is incomplete")
    }

    pub async fn save(&self) -> Result<()> {
        let result = self.session.save().await;
        self.renderer.render(&SaveOutcome(&result))?;
        if !result.success {
            bail!("Draft was not saved");
        }
        Ok(())
    }

    pub async fn handle_draft_command(&self, command: DraftCommands) -> Result<()> {
        match command {
            DraftCommands::Show => {
                let metadata = self
                    .session
                    .draft_metadata()
                    .await
                    .context("Failed to read draft")?;
                match metadata {
                    Some(metadata) => self.renderer.render(&metadata),
                    None => self.renderer.render("No saved draft.\n"),
                }
            }
            DraftCommands::Pending => self
                .renderer
                .render(&PendingOperations(self.session.queue().pending())),
            DraftCommands::Clear => {
                self.session
                    .clear_draft()
                    .await
                    .context("Failed to clear draft")?;
                self.renderer
                    .render(&OperationStatus::success("Draft cleared"))
            }
        }
    }

    pub async fn handle_support_command(&self, command: SupportCommands) -> Result<()> {
        match command {
            SupportCommands::Submit(args) => self.submit_support(args).await,
        }
    }

    async fn submit_support(&self, args: SubmitArgs) -> Result<()> {
        let mut request = args.request();
        let mut errors = validate_support_request(&request);

        let sizes = args
            .attachments
            .iter()
            .map(|path| {
                std::fs::metadata(path)
                    .map(|meta| (path.display().to_string(), meta.len()))
                    .with_context(|| format!("Failed to read {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        errors.extend(validate_files(
            sizes.iter().map(|(name, size)| (name.as_str(), *size)),
        ));

        if !errors.is_empty() {
            let mut output = String::new();
            for error in &errors {
                writeln!(output, "- {error}")?;
            }
            self.renderer.render(&output)?;
            bail!("Support request is incomplete");
        }

        for path in &args.attachments {
            let attachment = Attachment::from_path(path)
                .with_context(|| format!("Failed to attach {}", path.display()))?;
            request.attachments.push(attachment);
        }

        let client = match args.endpoint {
            Some(endpoint) => SupportClient::new(endpoint),
            None => SupportClient::default(),
        };
        let response = client.submit(&request).await;
        self.renderer.render(&TicketResult(&response))?;
        if !response.success {
            bail!("Support request was not submitted");
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let result = self.session.save().await;
        if !result.success {
            bail!(
                "Failed to save draft: {}",
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}
