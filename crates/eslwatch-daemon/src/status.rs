//! Read-only status surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eslwatch_core::BufferStats;

/// Snapshot of connection and buffer health.
///
/// Produced by [`Subscriber::status`](crate::subscriber::Subscriber::status)
/// for consumption by the embedding layer. Fields written by the
/// background task are read without blocking it; a snapshot racing a
/// concurrent write is stale but internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Whether a streaming session is currently established.
    pub connected: bool,
    /// The configured `host:port` endpoint.
    pub host_port: String,
    /// Whether the subscriber should be trying (distinct from
    /// `connected`).
    pub running: bool,
    /// Text of the most recent transport failure, cleared on a
    /// successful connect.
    pub last_error: Option<String>,
    /// Connection attempts since construction.
    pub connection_attempts: u64,
    /// Capture time of the most recent decoded event.
    pub last_event_time: Option<DateTime<Utc>>,
    /// Occupancy of the event buffer.
    pub buffer_stats: BufferStats,
    /// Whether the transport layer is usable. Always true here; kept
    /// for interface compatibility with deployments where the
    /// transport is an optional component.
    pub transport_available: bool,
}
