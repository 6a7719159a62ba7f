//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use execlink_core::{Endpoint, Operation, Orchestrator};

use crate::error::CliError;
use crate::output::Output;

/// Run one discovery cycle behind a spinner.
pub async fn discover(orch: &Orchestrator, out: &Output) -> Result<Endpoint, CliError> {
    let spinner = spinner(out, "Looking for the backend...");
    let result = orch.start().await;
    spinner.finish_and_clear();
    Ok(result?)
}

/// Local checks first, so a bad argument or a missing session never waits
/// on discovery.
pub async fn prepare(orch: &Orchestrator, op: &Operation, out: &Output) -> Result<(), CliError> {
    op.validate()?;
    orch.ensure_authenticated()?;
    discover(orch, out).await?;
    Ok(())
}

fn spinner(out: &Output, message: &'static str) -> ProgressBar {
    if out.quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}
