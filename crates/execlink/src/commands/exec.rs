//! Script execution, process attachment and identity spoofing.

use std::io::{self, IsTerminal, Read};

use execlink_core::{CommandResult, Operation, Orchestrator};

use crate::cli::{ExecArgs, InjectArgs, SpoofArgs};
use crate::error::CliError;
use crate::output::{self, Output};

use super::util;

pub async fn exec(orch: &Orchestrator, args: ExecArgs, out: &Output) -> Result<(), CliError> {
    let op = Operation::Execute {
        script: read_script(args)?,
    };
    run(orch, op, out).await
}

pub async fn inject(orch: &Orchestrator, args: InjectArgs, out: &Output) -> Result<(), CliError> {
    let op = Operation::Inject {
        process_name: args.process_name,
    };
    run(orch, op, out).await
}

pub async fn spoof(orch: &Orchestrator, args: SpoofArgs, out: &Output) -> Result<(), CliError> {
    let op = Operation::SpoofHwid {
        custom_hwid: args.hwid,
    };
    run(orch, op, out).await
}

/// Validate, authenticate, discover, send and print the outcome.
pub(super) async fn run(orch: &Orchestrator, op: Operation, out: &Output) -> Result<(), CliError> {
    util::prepare(orch, &op, out).await?;
    let result = orch.send(op).await?;
    let rendered = render_result(&result, out)?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}

pub(super) fn render_result(result: &CommandResult, out: &Output) -> Result<String, CliError> {
    output::render_single(out.format, result, result_detail, result_plain)
}

fn result_detail(result: &CommandResult) -> String {
    match result {
        CommandResult::Executed { output } => output.clone(),
        CommandResult::Injected { message, pid } => match pid {
            Some(pid) => format!("{message}\n{}", output::detail(&[("PID", pid.to_string())])),
            None => message.clone(),
        },
        CommandResult::Spoofed {
            message,
            original_id,
            current_id,
        } => {
            let mut lines = vec![message.clone()];
            if let Some(id) = original_id {
                lines.push(format!("Original HWID: {id}"));
            }
            if let Some(id) = current_id {
                lines.push(format!("New HWID: {id}"));
            }
            lines.join("\n")
        }
        CommandResult::FeatureToggled { message, .. } => message.clone(),
        CommandResult::Features { features } => features
            .iter()
            .map(|f| format!("{} {}", f.name, output::yes_no(f.enabled)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn result_plain(result: &CommandResult) -> String {
    match result {
        CommandResult::Executed { output } => output.clone(),
        CommandResult::Injected { pid, message } => {
            pid.map_or_else(|| message.clone(), |pid| pid.to_string())
        }
        CommandResult::Spoofed {
            current_id,
            message,
            ..
        } => current_id.clone().unwrap_or_else(|| message.clone()),
        CommandResult::FeatureToggled { enabled, .. } => enabled.to_string(),
        CommandResult::Features { features } => features
            .iter()
            .map(|f| f.name.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// `--file`, a literal argument, `-` for stdin, or piped stdin when no
/// argument is given. An interactive terminal with no script yields an
/// empty one, which validation rejects.
fn read_script(args: ExecArgs) -> Result<String, CliError> {
    if let Some(path) = args.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    match args.script {
        Some(script) if script == "-" => read_stdin(),
        Some(script) => Ok(script),
        None if io::stdin().is_terminal() => Ok(String::new()),
        None => read_stdin(),
    }
}

fn read_stdin() -> Result<String, CliError> {
    let mut script = String::new();
    io::stdin().read_to_string(&mut script)?;
    Ok(script)
}
