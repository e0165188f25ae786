//! Protocol error types for the event socket layer.
//!
//! Structured errors let the connection manager distinguish failures
//! that end a session (transport, oversized frames) from per-frame
//! decode problems that only drop the offending frame.

use std::io;

use thiserror::Error;

/// Maximum body size in bytes (1 MiB).
///
/// Event bodies are short header blocks or log lines; a peer
/// announcing more than this is misbehaving. Checked before
/// allocation.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum header block size in bytes (64 KiB).
///
/// Bounds buffering while scanning for the blank-line terminator, so a
/// peer that never sends one cannot grow the read buffer indefinitely.
pub const MAX_HEADER_BLOCK_SIZE: usize = 64 * 1024;

/// Errors for event socket protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Announced body length exceeds [`MAX_FRAME_SIZE`].
    #[error("frame too large: {size} bytes exceeds maximum {max} bytes")]
    FrameTooLarge {
        /// Size announced by the `Content-Length` header.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Frame structure does not match the expected format.
    #[error("invalid frame: {reason}")]
    InvalidFrame {
        /// Description of the framing problem.
        reason: String,
    },

    /// The peer rejected the shared-secret credential.
    #[error("authentication rejected: {reply}")]
    AuthRejected {
        /// Reply text from the peer.
        reply: String,
    },

    /// The peer rejected a command issued on the session.
    #[error("command rejected: {reply}")]
    CommandRejected {
        /// Reply text from the peer.
        reply: String,
    },

    /// The peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Timeout waiting for a response or operation.
    #[error("operation timed out after {duration_ms} ms")]
    Timeout {
        /// Bound that elapsed, in milliseconds.
        duration_ms: u64,
    },

    /// Underlying I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl ProtocolError {
    /// True when the error only invalidates one frame, not the session.
    #[must_use]
    pub const fn is_per_frame(&self) -> bool {
        matches!(self, Self::InvalidFrame { .. })
    }
}
