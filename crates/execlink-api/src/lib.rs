// execlink-api: Async Rust client for the execlink console backend

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use auth::Registration;
pub use client::BackendClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use websocket::{FrameStream, StreamTransport, WsTransport};
