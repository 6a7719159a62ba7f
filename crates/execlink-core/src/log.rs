// ── Console log sink ──
//
// Every component reports user-facing progress here. Lines are fanned out
// over a broadcast channel and kept in a bounded history so a subscriber
// that attaches late (e.g. the CLI after `start()`) can replay them.
// Each line is mirrored to `tracing` at a level matching its kind.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 256;

/// Origin of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Orchestrator lifecycle: discovery, stream and session changes.
    System,
    Error,
    /// Output returned by a command.
    Execution,
    /// A raw frame received on the event stream.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            // Stream frames are opaque and rendered verbatim.
            LogKind::Stream => f.write_str(&self.text),
            kind => write!(f, "[{kind}] {}", self.text),
        }
    }
}

/// Cloneable handle to the shared console log.
#[derive(Clone)]
pub struct LogSink {
    inner: Arc<Inner>,
}

struct Inner {
    tx: broadcast::Sender<LogLine>,
    history: Mutex<VecDeque<LogLine>>,
    capacity: usize,
}

impl LogSink {
    /// Create a sink keeping at most `history` lines for replay.
    pub fn new(history: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tx,
                history: Mutex::new(VecDeque::with_capacity(history.min(CHANNEL_CAPACITY))),
                capacity: history,
            }),
        }
    }

    pub fn system(&self, text: impl Into<String>) {
        self.push(LogKind::System, text.into());
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(LogKind::Error, text.into());
    }

    pub fn execution(&self, text: impl Into<String>) {
        self.push(LogKind::Execution, text.into());
    }

    pub fn stream(&self, text: impl Into<String>) {
        self.push(LogKind::Stream, text.into());
    }

    /// Receive every line pushed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.inner.tx.subscribe()
    }

    /// Retained lines, oldest first.
    pub fn history(&self) -> Vec<LogLine> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn push(&self, kind: LogKind, text: String) {
        match kind {
            LogKind::System => info!(target: "execlink::console", "{text}"),
            LogKind::Error => warn!(target: "execlink::console", "{text}"),
            LogKind::Execution | LogKind::Stream => {
                debug!(target: "execlink::console", kind = %kind, "{text}");
            }
        }

        let line = LogLine {
            kind,
            text,
            at: Utc::now(),
        };

        if self.inner.capacity > 0 {
            let mut history = self
                .inner
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if history.len() == self.inner.capacity {
                history.pop_front();
            }
            history.push_back(line.clone());
        }

        // No receivers is fine: the history still has it.
        let _ = self.inner.tx.send(line);
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("capacity", &self.inner.capacity)
            .field("receivers", &self.inner.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lines_render_with_kind_prefix() {
        let sink = LogSink::new(10);
        sink.system("Trying to connect to port 8080...");
        sink.stream("raw frame");

        let rendered: Vec<String> = sink.history().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["[System] Trying to connect to port 8080...", "raw frame"]
        );
    }

    #[test]
    fn history_is_bounded() {
        let sink = LogSink::new(2);
        sink.system("one");
        sink.system("two");
        sink.error("three");

        let texts: Vec<String> = sink.history().into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let sink = LogSink::new(0);
        let mut rx = sink.subscribe();
        sink.stream("a");
        sink.stream("b");

        assert_eq!(rx.recv().await.unwrap().text, "a");
        assert_eq!(rx.recv().await.unwrap().text, "b");
        assert!(sink.history().is_empty());
    }
}
