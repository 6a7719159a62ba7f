// ── API-to-domain type conversions ──
//
// Bridges raw `execlink_api` response types into `execlink_core::model`.
// The backend encodes "absent" as zero values (PID 0, year-1 timestamps),
// which become `None` here.

use chrono::{DateTime, Datelike, Utc};

use execlink_api::models::{self as api, PortStatus};

use crate::model::{DeviceIdentityState, Feature, Identity, InjectionState, StatusSnapshot};

// ── Helpers ────────────────────────────────────────────────────────

/// Go's zero `time.Time` serializes as `0001-01-01T00:00:00Z`.
fn non_zero_time(ts: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    ts.filter(|t| t.year() > 1)
}

fn non_zero_pid(pid: i64) -> Option<i64> {
    (pid > 0).then_some(pid)
}

// ── Conversions ────────────────────────────────────────────────────

impl From<api::Feature> for Feature {
    fn from(f: api::Feature) -> Self {
        Self {
            name: f.name,
            description: f.description,
            enabled: f.enabled,
        }
    }
}

impl From<api::InjectorStatus> for InjectionState {
    fn from(s: api::InjectorStatus) -> Self {
        Self {
            attached: s.injected,
            pid: non_zero_pid(s.injected_pid),
            attached_at: non_zero_time(s.injected_at),
            features: s.features.into_iter().map(Feature::from).collect(),
        }
    }
}

impl From<api::HwidStatus> for DeviceIdentityState {
    fn from(h: api::HwidStatus) -> Self {
        Self {
            original_id: h.original_hwid,
            current_id: h.current_hwid,
            spoofed: h.spoofed,
        }
    }
}

impl From<api::User> for Identity {
    fn from(user: api::User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            created_at: non_zero_time(user.created_at),
            last_login: non_zero_time(user.last_login),
        }
    }
}

/// Build a snapshot from a probe response.
///
/// `fallback_port` is the probed candidate's port, used when the backend's
/// `port` field is missing or not a number.
pub fn snapshot_from_status(status: PortStatus, fallback_port: u16) -> StatusSnapshot {
    StatusSnapshot {
        port: status.port.trim().parse().unwrap_or(fallback_port),
        status: status.status,
        tcp_port: status.tcp_port,
        injection: status.injector_status.into(),
        identity: status.hwid.into(),
        observed_at: Utc::now(),
    }
}
