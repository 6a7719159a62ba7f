// ── Stream supervisor ──
//
// Owns the single event-stream connection to the discovered endpoint.
//
//   Idle ──connect──▶ Connecting ──ok──▶ Open ──close/error/remote──▶ Closed ──▶ Idle
//                         └──────────────fail───────────────────────────▲
//
// Every transition happens while holding the `active` lock, and the
// previous reader task is awaited to completion before a new handshake
// starts, so two sessions can never be live at once. There is no
// reconnect here: callers react to connectivity=false by rediscovering.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use execlink_api::{FrameStream, StreamTransport};

use crate::error::CoreError;
use crate::log::LogSink;
use crate::model::Endpoint;

/// Lifecycle of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum StreamState {
    Idle,
    Connecting,
    Open,
    Closed,
}

// ── Shared state ─────────────────────────────────────────────────────

struct Shared {
    state: watch::Sender<StreamState>,
    connected: watch::Sender<bool>,
    log: LogSink,
}

impl Shared {
    fn set_state(&self, state: StreamState) {
        debug!(state = %state, "stream state");
        self.state.send_replace(state);
    }

    /// Terminal transition for one session. Runs at most once per session
    /// no matter how many paths race to end it.
    fn finish(&self, finished: &AtomicBool) {
        if finished.swap(true, Ordering::AcqRel) {
            return;
        }
        self.set_state(StreamState::Closed);
        self.connected.send_replace(false);
        self.log.system("Disconnected from WebSocket");
        self.set_state(StreamState::Idle);
    }
}

struct ActiveSession {
    endpoint: Endpoint,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    finished: Arc<AtomicBool>,
}

impl ActiveSession {
    fn is_live(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "stream reader task failed");
        }
    }
}

// ── StreamSupervisor ─────────────────────────────────────────────────

pub struct StreamSupervisor<T: StreamTransport> {
    transport: T,
    handshake_timeout: Duration,
    active: Mutex<Option<ActiveSession>>,
    shared: Arc<Shared>,
}

impl<T: StreamTransport> StreamSupervisor<T> {
    pub fn new(transport: T, log: LogSink, handshake_timeout: Duration) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        let (connected, _) = watch::channel(false);
        Self {
            transport,
            handshake_timeout,
            active: Mutex::new(None),
            shared: Arc::new(Shared {
                state,
                connected,
                log,
            }),
        }
    }

    /// Open a session to `endpoint`.
    ///
    /// No-op if a live session to the same endpoint already exists; any
    /// other session is closed first.
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        let mut active = self.active.lock().await;

        if let Some(session) = active.as_ref() {
            if session.is_live() && session.endpoint == *endpoint {
                debug!(endpoint = %endpoint, "stream already open");
                return Ok(());
            }
        }
        if let Some(session) = active.take() {
            session.shutdown().await;
        }

        self.shared.set_state(StreamState::Connecting);
        self.shared.log.system(format!(
            "Connecting to WebSocket on port {}...",
            endpoint.port()
        ));

        let frames = match tokio::time::timeout(
            self.handshake_timeout,
            self.transport.open(endpoint.stream_url()),
        )
        .await
        {
            Ok(Ok(frames)) => frames,
            Ok(Err(e)) => return Err(self.fail_handshake(e.to_string())),
            Err(_) => {
                return Err(self.fail_handshake(format!(
                    "handshake timed out after {}ms",
                    self.handshake_timeout.as_millis()
                )));
            }
        };

        self.shared.set_state(StreamState::Open);
        self.shared.connected.send_replace(true);
        self.shared.log.system(format!(
            "Successfully connected to WebSocket on port {}",
            endpoint.port()
        ));

        let cancel = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(read_frames(
            frames,
            cancel.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&finished),
        ));

        *active = Some(ActiveSession {
            endpoint: endpoint.clone(),
            cancel,
            task,
            finished,
        });
        Ok(())
    }

    /// Close the current session. Idempotent.
    pub async fn close(&self) {
        let session = self.active.lock().await.take();
        if let Some(session) = session {
            session.shutdown().await;
        }
    }

    pub fn state(&self) -> StreamState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.shared.state.subscribe()
    }

    /// Fires `true` on entering Open and `false` on every terminal close.
    pub fn subscribe_connectivity(&self) -> watch::Receiver<bool> {
        self.shared.connected.subscribe()
    }

    fn fail_handshake(&self, reason: String) -> CoreError {
        self.shared.set_state(StreamState::Closed);
        self.shared
            .log
            .error(format!("WebSocket connection error: {reason}"));
        self.shared.set_state(StreamState::Idle);
        CoreError::StreamClosed { reason }
    }
}

impl<T: StreamTransport> Drop for StreamSupervisor<T> {
    fn drop(&mut self) {
        if let Some(session) = self.active.get_mut().take() {
            session.cancel.cancel();
        }
    }
}

/// Forward frames to the log sink, in order, until the stream ends or
/// the session is cancelled.
async fn read_frames(
    mut frames: FrameStream,
    cancel: CancellationToken,
    shared: Arc<Shared>,
    finished: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = frames.next() => match frame {
                Some(Ok(text)) => shared.log.stream(text),
                Some(Err(e)) => {
                    shared.log.error(format!("WebSocket connection error: {e}"));
                    break;
                }
                None => break,
            },
        }
    }

    // Release the connection before announcing the close.
    drop(frames);
    shared.finish(&finished);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;
    use url::Url;

    use super::*;

    type FrameTx = mpsc::UnboundedSender<Result<String, execlink_api::Error>>;

    struct LiveGuard(Arc<AtomicUsize>);

    impl Drop for LiveGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Channel-backed transport counting concurrently live streams.
    #[derive(Default)]
    struct FakeState {
        fail: bool,
        opens: AtomicUsize,
        live: Arc<AtomicUsize>,
        max_live: AtomicUsize,
        senders: StdMutex<Vec<FrameTx>>,
    }

    impl FakeState {
        fn last_sender(&self) -> FrameTx {
            self.senders.lock().unwrap().last().cloned().unwrap()
        }
    }

    struct FakeTransport(Arc<FakeState>);

    impl StreamTransport for FakeTransport {
        async fn open(&self, _url: &Url) -> Result<FrameStream, execlink_api::Error> {
            tokio::task::yield_now().await;
            let state = &self.0;
            if state.fail {
                return Err(execlink_api::Error::WebSocketConnect("refused".into()));
            }
            state.opens.fetch_add(1, Ordering::SeqCst);
            let now_live = state.live.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_live.fetch_max(now_live, Ordering::SeqCst);

            let (tx, rx) = mpsc::unbounded_channel();
            state.senders.lock().unwrap().push(tx);
            let guard = LiveGuard(Arc::clone(&state.live));
            let stream = UnboundedReceiverStream::new(rx).map(move |frame| {
                let _held = &guard;
                frame
            });
            Ok(Box::pin(stream))
        }
    }

    fn supervisor(state: &Arc<FakeState>) -> (StreamSupervisor<FakeTransport>, LogSink) {
        let log = LogSink::new(100);
        let sup = StreamSupervisor::new(
            FakeTransport(Arc::clone(state)),
            log.clone(),
            Duration::from_secs(2),
        );
        (sup, log)
    }

    fn endpoint(port: u16) -> Endpoint {
        Endpoint::new("localhost", port, 9000).unwrap()
    }

    #[tokio::test]
    async fn frames_are_forwarded_in_order() {
        let transport = Arc::new(FakeState::default());
        let (sup, log) = supervisor(&transport);
        let mut rx = log.subscribe();

        sup.connect(&endpoint(8080)).await.unwrap();
        assert_eq!(sup.state(), StreamState::Open);
        assert!(sup.is_connected());

        let tx = transport.last_sender();
        for frame in ["one", "two", "three"] {
            tx.send(Ok(frame.to_string())).unwrap();
        }

        let mut received = Vec::new();
        while received.len() < 3 {
            let line = rx.recv().await.unwrap();
            if line.kind == crate::log::LogKind::Stream {
                received.push(line.text);
            }
        }
        assert_eq!(received, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn connect_to_same_endpoint_is_noop() {
        let transport = Arc::new(FakeState::default());
        let (sup, _log) = supervisor(&transport);

        sup.connect(&endpoint(8080)).await.unwrap();
        sup.connect(&endpoint(8080)).await.unwrap();

        assert_eq!(transport.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connect_to_new_endpoint_replaces_session() {
        let transport = Arc::new(FakeState::default());
        let (sup, _log) = supervisor(&transport);

        sup.connect(&endpoint(8080)).await.unwrap();
        sup.connect(&endpoint(8081)).await.unwrap();

        assert_eq!(transport.opens.load(Ordering::SeqCst), 2);
        assert_eq!(transport.live.load(Ordering::SeqCst), 1);
        assert_eq!(transport.max_live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remote_close_returns_to_idle() {
        let transport = Arc::new(FakeState::default());
        let (sup, log) = supervisor(&transport);
        let mut connectivity = sup.subscribe_connectivity();

        sup.connect(&endpoint(8080)).await.unwrap();
        connectivity.wait_for(|c| *c).await.unwrap();

        // Dropping every sender ends the fake stream like a server close.
        transport.senders.lock().unwrap().clear();
        connectivity.wait_for(|c| !*c).await.unwrap();

        let mut state = sup.subscribe_state();
        state.wait_for(|s| *s == StreamState::Idle).await.unwrap();
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);

        let disconnects = log
            .history()
            .iter()
            .filter(|l| l.text == "Disconnected from WebSocket")
            .count();
        assert_eq!(disconnects, 1);

        // A dead session is never reused: the next connect opens a new one.
        sup.connect(&endpoint(8080)).await.unwrap();
        assert_eq!(transport.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_handshake_reports_stream_closed() {
        let transport = Arc::new(FakeState {
            fail: true,
            ..FakeState::default()
        });
        let (sup, log) = supervisor(&transport);

        let err = sup.connect(&endpoint(8080)).await.unwrap_err();
        assert!(matches!(err, CoreError::StreamClosed { .. }));
        assert_eq!(sup.state(), StreamState::Idle);
        assert!(!sup.is_connected());

        let errors = log
            .history()
            .iter()
            .filter(|l| l.kind == crate::log::LogKind::Error)
            .count();
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let transport = Arc::new(FakeState::default());
        let (sup, log) = supervisor(&transport);

        sup.close().await;
        sup.connect(&endpoint(8080)).await.unwrap();
        sup.close().await;
        sup.close().await;

        assert_eq!(sup.state(), StreamState::Idle);
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);
        let disconnects = log
            .history()
            .iter()
            .filter(|l| l.text == "Disconnected from WebSocket")
            .count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rapid_reentrant_calls_keep_one_session() {
        let transport = Arc::new(FakeState::default());
        let (sup, _log) = supervisor(&transport);
        let sup = Arc::new(sup);

        let mut tasks = Vec::new();
        for i in 0..40u16 {
            let sup = Arc::clone(&sup);
            tasks.push(tokio::spawn(async move {
                if i % 5 == 0 {
                    sup.close().await;
                } else {
                    sup.connect(&endpoint(8080 + i % 3)).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(transport.max_live.load(Ordering::SeqCst), 1);
        sup.close().await;
        assert_eq!(transport.live.load(Ordering::SeqCst), 0);
        assert_eq!(sup.state(), StreamState::Idle);
    }
}
