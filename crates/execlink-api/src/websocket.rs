//! Event stream transport.
//!
//! The backend pushes opaque log lines over `ws://<host>:<port>/ws`; the
//! client never sends frames. [`StreamTransport`] is the seam between the
//! stream supervisor and the socket: [`WsTransport`] is the real
//! `tokio-tungstenite` implementation, and tests substitute a fake that
//! yields frames from a channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use execlink_api::websocket::{StreamTransport, WsTransport};
//! use futures_util::StreamExt;
//!
//! let url = url::Url::parse("ws://localhost:8082/ws")?;
//! let mut frames = WsTransport.open(&url).await?;
//! while let Some(Ok(line)) = frames.next().await {
//!     println!("{line}");
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use url::Url;

use crate::error::Error;

/// Inbound text frames, in arrival order. The stream ends when the
/// connection closes; a transport error is yielded once, then the stream ends.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Opens one event-stream connection.
pub trait StreamTransport: Send + Sync + 'static {
    /// Connect to `url` and return the inbound frame stream once the
    /// handshake has completed.
    fn open(&self, url: &Url) -> impl Future<Output = Result<FrameStream, Error>> + Send;
}

// ── WsTransport ──────────────────────────────────────────────────────

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl StreamTransport for WsTransport {
    async fn open(&self, url: &Url) -> Result<FrameStream, Error> {
        tracing::info!(url = %url, "Connecting to WebSocket");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("WebSocket connected");

        // Outbound frames are not part of the protocol; only the read half is kept.
        let (_write, mut read) = ws_stream.split();

        let frames = async_stream::stream! {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(tungstenite::Message::Text(text)) => {
                        yield Ok(text.as_str().to_owned());
                    }
                    Ok(tungstenite::Message::Binary(bytes)) => {
                        yield Ok(String::from_utf8_lossy(&bytes).into_owned());
                    }
                    Ok(tungstenite::Message::Ping(_)) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Ok(tungstenite::Message::Close(frame)) => {
                        match frame {
                            Some(cf) if cf.code != CloseCode::Normal => {
                                tracing::info!(
                                    code = %cf.code,
                                    reason = %cf.reason,
                                    "WebSocket closed abnormally"
                                );
                                yield Err(Error::WebSocketClosed {
                                    code: u16::from(cf.code),
                                    reason: cf.reason.to_string(),
                                });
                            }
                            Some(_) => tracing::info!("WebSocket close frame received"),
                            None => tracing::info!("WebSocket close frame received (no payload)"),
                        }
                        break;
                    }
                    Ok(_) => {
                        // Pong, raw Frame -- ignore
                    }
                    Err(e) => {
                        yield Err(Error::WebSocketConnect(e.to_string()));
                        break;
                    }
                }
            }
            tracing::debug!("WebSocket stream ended");
        };

        Ok(Box::pin(frames))
    }
}

/// Derive the event-stream URL from an HTTP base URL.
///
/// `http://host:port` becomes `ws://host:port/ws`; `https` maps to `wss`.
pub fn stream_url(base_url: &Url) -> Result<Url, Error> {
    let scheme = if base_url.scheme() == "https" { "wss" } else { "ws" };
    let host = base_url.host_str().unwrap_or("localhost");
    let raw = match base_url.port() {
        Some(p) => format!("{scheme}://{host}:{p}/ws"),
        None => format!("{scheme}://{host}/ws"),
    };
    Ok(Url::parse(&raw)?)
}

// ── Tests ────────────────────────────────────────────────────────────
