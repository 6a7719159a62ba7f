//! Live console: prints every log line and rediscovers when the event
//! stream drops or never opens. Runs until Ctrl-C, or until a discovery
//! cycle gives up.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use execlink_core::{CoreError, Endpoint, Orchestrator, StreamState};

use crate::error::CliError;
use crate::output::{self, Output};

type Cycle<'a> = Pin<Box<dyn Future<Output = Result<Endpoint, CoreError>> + 'a>>;

pub async fn handle(orch: &Orchestrator, out: &Output) -> Result<(), CliError> {
    // Subscribe before the first cycle so none of its lines are missed.
    let mut lines = orch.subscribe_log();
    let mut connectivity = orch.subscribe_connectivity();
    let mut was_connected = *connectivity.borrow_and_update();
    let mut cycle: Option<Cycle<'_>> = Some(Box::pin(orch.start()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("console interrupted");
                break;
            }
            line = lines.recv() => match line {
                Ok(line) => output::print_output(&output::log_line(&line, out.color), out.quiet),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "console fell behind the log"),
                Err(RecvError::Closed) => break,
            },
            Ok(()) = connectivity.changed() => {
                let connected = *connectivity.borrow_and_update();
                if was_connected && !connected && cycle.is_none() {
                    cycle = Some(Box::pin(orch.reconnect()));
                }
                was_connected = connected;
            }
            result = next_cycle(&mut cycle) => {
                cycle = None;
                match result {
                    Ok(endpoint) if orch.stream_state() == StreamState::Open => {
                        debug!(endpoint = %endpoint, "console attached");
                    }
                    // Backend answered but the stream handshake failed.
                    Ok(endpoint) => {
                        debug!(endpoint = %endpoint, "event stream not open, rediscovering");
                        cycle = Some(Box::pin(reconnect_after(orch, orch.config().retry_delay)));
                    }
                    Err(e) => {
                        flush(&mut lines, out);
                        return Err(e.into());
                    }
                }
            }
        }
    }

    flush(&mut lines, out);
    Ok(())
}

async fn reconnect_after(orch: &Orchestrator, delay: Duration) -> Result<Endpoint, CoreError> {
    tokio::time::sleep(delay).await;
    orch.reconnect().await
}

/// Resolves with the in-flight cycle's result, or never when idle.
async fn next_cycle(cycle: &mut Option<Cycle<'_>>) -> Result<Endpoint, CoreError> {
    match cycle {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Print lines already queued when the loop ends.
fn flush(lines: &mut tokio::sync::broadcast::Receiver<execlink_core::LogLine>, out: &Output) {
    while let Ok(line) = lines.try_recv() {
        output::print_output(&output::log_line(&line, out.color), out.quiet);
    }
}
