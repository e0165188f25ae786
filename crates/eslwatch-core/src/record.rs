//! Normalized event records.
//!
//! An [`EventRecord`] is the immutable representation of one decoded
//! switch notification. Records are created by the classifier (or by the
//! subscriber for synthetic lifecycle markers) and never mutated after
//! they enter the buffer.
//!
//! Per-family extracted fields are carried as a tagged [`EventDetails`]
//! union rather than an untyped map; the complete raw header mapping is
//! retained separately for diagnostic replay.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level assigned to a record at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic noise: log passthrough, heartbeats.
    Debug,
    /// Normal activity: calls, registrations, everything unclassified.
    Info,
    /// Noteworthy but expected: hangups, disconnects.
    Warning,
    /// Failures: registration failures, transport errors.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Fields extracted for a specific event family.
///
/// Only the fields meaningful to the family are present; a header that
/// was absent on the wire is `None`, never a placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum EventDetails {
    /// Channel lifecycle events (create/answer/hangup).
    Call {
        #[serde(skip_serializing_if = "Option::is_none")]
        caller_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        uuid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        direction: Option<String>,
    },
    /// Endpoint registration events.
    Registration {
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ip: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        profile: Option<String>,
    },
    /// Upstream gateway state changes.
    Gateway {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    /// Periodic keep-alive counters.
    Heartbeat {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_count: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        uptime: Option<String>,
    },
    /// Log line passthrough.
    Log {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<String>,
    },
    /// No family-specific fields apply.
    None,
}

/// One decoded inbound notification, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Protocol event name (e.g. `CHANNEL_CREATE`, `HEARTBEAT`).
    pub event_type: String,
    /// Finer-grained custom tag (e.g. `sofia::register`), empty if absent.
    pub event_subtype: String,
    /// Wall-clock capture time, assigned at classification, never by the
    /// remote peer.
    pub timestamp: DateTime<Utc>,
    /// Human-readable capture time for display surfaces.
    pub datetime: String,
    /// Severity derived from the event type and subtype.
    pub severity: Severity,
    /// Short human-readable summary, bounded length.
    pub summary: String,
    /// Type-specific extracted fields.
    pub details: EventDetails,
    /// Complete original header mapping, kept for diagnostic replay.
    pub raw_headers: BTreeMap<String, String>,
}

impl EventRecord {
    /// Builds a record stamped with the current wall-clock time.
    #[must_use]
    pub fn new(
        event_type: String,
        event_subtype: String,
        severity: Severity,
        summary: String,
        details: EventDetails,
        raw_headers: BTreeMap<String, String>,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            event_type,
            event_subtype,
            datetime: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp,
            severity,
            summary,
            details,
            raw_headers,
        }
    }

    /// Builds a synthetic `SYSTEM` record for connection lifecycle
    /// markers (`CONNECTED`, `DISCONNECTED`, `ERROR`).
    #[must_use]
    pub fn system(subtype: &str, text: impl Into<String>, severity: Severity) -> Self {
        Self::new(
            "SYSTEM".to_string(),
            subtype.to_string(),
            severity,
            text.into(),
            EventDetails::None,
            BTreeMap::new(),
        )
    }

    /// Capture time as fractional seconds since the Unix epoch.
    ///
    /// This is the value compared by the buffer's `since` query.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn epoch_secs(&self) -> f64 {
        let micros = self.timestamp.timestamp_micros();
        micros as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_record_has_no_details() {
        let record = EventRecord::system("CONNECTED", "connected", Severity::Info);
        assert_eq!(record.event_type, "SYSTEM");
        assert_eq!(record.event_subtype, "CONNECTED");
        assert_eq!(record.details, EventDetails::None);
        assert!(record.raw_headers.is_empty());
    }

    #[test]
    fn epoch_secs_tracks_timestamp() {
        let record = EventRecord::system("CONNECTED", "x", Severity::Info);
        let expected = record.timestamp.timestamp_micros() as f64 / 1_000_000.0;
        assert!((record.epoch_secs() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn details_omit_absent_fields() {
        let details = EventDetails::Registration {
            user: Some("alice".to_string()),
            ip: None,
            profile: None,
        };
        let json = serde_json::to_string(&details).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("\"ip\""));
        assert!(!json.contains("\"profile\""));
    }
}
