// ── Domain model ──
//
// The orchestrator's canonical types. Wire shapes from `execlink-api`
// are translated into these in `convert.rs`; consumers (CLI) depend
// only on what is defined here.

pub mod credential;
pub mod endpoint;
pub mod status;

// ── Re-exports ──────────────────────────────────────────────────────

pub use credential::{Credential, Identity, StoredSession};
pub use endpoint::{ConnectionInfo, Endpoint};
pub use status::{DeviceIdentityState, Feature, InjectionState, StatusSnapshot};
