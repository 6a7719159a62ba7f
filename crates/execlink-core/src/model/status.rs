// ── Status snapshot domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A toggleable backend feature (e.g. `hwid_spoofer`, `anti_debug`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// Process-attachment state reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionState {
    pub attached: bool,
    pub pid: Option<i64>,
    pub attached_at: Option<DateTime<Utc>>,
    pub features: Vec<Feature>,
}

/// Device-identity state reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentityState {
    pub original_id: String,
    pub current_id: String,
    pub spoofed: bool,
}

/// Last server-confirmed backend state.
///
/// Built in one piece from a status probe and swapped in whole; nothing in
/// the crate mutates a published snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Backend-reported port state (`"connected"`, `"connecting"`, `"failed"`).
    pub status: String,
    pub port: u16,
    pub tcp_port: u16,
    pub injection: InjectionState,
    pub identity: DeviceIdentityState,
    pub observed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.injection.features.iter().find(|f| f.name == name)
    }

    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}
