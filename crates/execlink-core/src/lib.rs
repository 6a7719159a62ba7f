//! Connection and session orchestrator for the execlink console.
//!
//! Sits between `execlink-api` and front ends (the `execlink` CLI):
//!
//! - **[`Orchestrator`]** owns the discovered endpoint, the credential,
//!   the last status snapshot and the single event-stream session.
//!   [`start()`](Orchestrator::start) discovers a backend and opens the
//!   stream; [`shutdown()`](Orchestrator::shutdown) releases everything.
//!
//! - **[`DiscoveryEngine`]** walks a fixed candidate list with linear
//!   retry through a [`Prober`]. A new cycle cancels the previous one.
//!
//! - **[`StreamSupervisor`]** keeps at most one event stream open and
//!   forwards every inbound frame to the [`LogSink`]. It never reconnects
//!   on its own; front ends rediscover when connectivity drops.
//!
//! - **[`SessionStore`]** holds the bearer credential with pluggable
//!   [`SessionPersistence`]. Any 401 clears it.
//!
//! - **[`CommandDispatcher`]** runs authenticated [`Operation`]s and
//!   refreshes the [`StatusMirror`] after state-changing ones.

pub mod command;
pub mod config;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod log;
pub mod mirror;
pub mod model;
pub mod orchestrator;
pub mod prober;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    CommandDispatcher, CommandResult, Operation, validate_login, validate_registration,
};
pub use config::{Candidate, OrchestratorConfig};
pub use discovery::DiscoveryEngine;
pub use error::CoreError;
pub use log::{LogKind, LogLine, LogSink};
pub use mirror::StatusMirror;
pub use orchestrator::{ConnectionState, Orchestrator};
pub use prober::{HttpProber, Probed, Prober};
pub use session::{MemoryPersistence, SessionPersistence, SessionStore};
pub use stream::{StreamState, StreamSupervisor};

pub use model::{
    ConnectionInfo, Credential, DeviceIdentityState, Endpoint, Feature, Identity, InjectionState,
    StatusSnapshot, StoredSession,
};

// Front ends build registrations without depending on the API crate.
pub use execlink_api::Registration;
