//! Status and connection-info handlers.

use execlink_core::{ConnectionInfo, Orchestrator, StatusSnapshot};

use crate::error::CliError;
use crate::output::{self, Output};

use super::util;

pub async fn status(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    util::discover(orch, out).await?;
    let snapshot = orch
        .status()
        .ok_or_else(|| CliError::Internal("discovery produced no status".into()))?;
    let stream = orch.stream_state().to_string();

    let rendered = output::render_single(
        out.format,
        &*snapshot,
        |s| status_detail(s, &stream, out.color),
        |s| s.status.clone(),
    )?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}

fn status_detail(s: &StatusSnapshot, stream: &str, color: bool) -> String {
    let attached = match (s.injection.attached, s.injection.pid) {
        (true, Some(pid)) => format!("yes (pid {pid})"),
        (attached, _) => output::yes_no(attached),
    };
    let enabled: Vec<&str> = s
        .injection
        .features
        .iter()
        .filter(|f| f.enabled)
        .map(|f| f.name.as_str())
        .collect();
    let features = if enabled.is_empty() {
        "none enabled".to_owned()
    } else {
        enabled.join(", ")
    };

    output::detail(&[
        ("Status", output::state_word(&s.status, s.is_connected(), color)),
        ("Port", s.port.to_string()),
        ("TCP port", s.tcp_port.to_string()),
        ("Stream", stream.to_owned()),
        ("Attached", attached),
        ("Original HWID", s.identity.original_id.clone()),
        ("Current HWID", s.identity.current_id.clone()),
        ("Spoofed", output::yes_no(s.identity.spoofed)),
        ("Features", features),
        ("Observed", s.observed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
    ])
}

pub async fn info(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    let endpoint = util::discover(orch, out).await?;
    let info = endpoint.connection_info();

    let rendered = output::render_single(out.format, &info, info_detail, |i| i.http_url.clone())?;
    output::print_output(&rendered, out.quiet);
    Ok(())
}

fn info_detail(info: &ConnectionInfo) -> String {
    output::detail(&[
        ("HTTP", info.http_url.clone()),
        ("Stream", info.stream_url.clone()),
        ("TCP", info.tcp_address.clone()),
    ])
}
