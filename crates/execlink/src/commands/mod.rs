//! Command dispatch: bridges CLI args -> orchestrator calls -> output formatting.

pub mod config_cmd;
pub mod console;
pub mod exec;
pub mod features;
pub mod session;
pub mod status;
pub mod util;

use execlink_core::Orchestrator;

use crate::cli::Command;
use crate::error::CliError;
use crate::output::Output;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::status(orch, out).await,
        Command::Info => status::info(orch, out).await,
        Command::Login(args) => session::login(orch, args, out).await,
        Command::Register(args) => session::register(orch, args, out).await,
        Command::Logout => session::logout(orch, out),
        Command::Whoami => session::whoami(orch, out),
        Command::Exec(args) => exec::exec(orch, args, out).await,
        Command::Inject(args) => exec::inject(orch, args, out).await,
        Command::SpoofHwid(args) => exec::spoof(orch, args, out).await,
        Command::Features(args) => features::handle(orch, args, out).await,
        Command::Console(_) => console::handle(orch, out).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a backend".into(),
        )),
    }
}
