//! Event socket wire protocol.
//!
//! This module implements the text-oriented control-plane protocol the
//! switch speaks over TCP: MIME-style header blocks terminated by a
//! blank line, with an optional `Content-Length`-delimited body.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Decoded events (EslEvent)         │  frame::EslEvent
//! ├─────────────────────────────────────────┤
//! │        Frames (headers + body)           │  frame::EslFrame
//! ├─────────────────────────────────────────┤
//! │        Framing (header block scan)       │  codec::EslCodec
//! ├─────────────────────────────────────────┤
//! │        TCP transport                     │  tokio::net::TcpStream
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Wire Format
//!
//! Inbound frames are a header block of `Name: value` lines ending in a
//! blank line. When a `Content-Length` header is present, exactly that
//! many bytes of body follow the blank line:
//!
//! ```text
//! Content-Length: 542
//! Content-Type: text/event-plain
//!
//! Event-Name: CHANNEL_CREATE
//! Caller-Caller-ID-Number: 100
//! ...
//! ```
//!
//! Outbound commands are plain text terminated by a double newline.
//!
//! Frame sizes are validated before allocation; a peer announcing an
//! oversized body terminates the session rather than exhausting memory.

pub mod codec;
pub mod error;
pub mod frame;

pub use codec::EslCodec;
pub use error::{ProtocolError, ProtocolResult, MAX_FRAME_SIZE, MAX_HEADER_BLOCK_SIZE};
pub use frame::{
    EslEvent, EslFrame, CONTENT_TYPE_API_RESPONSE, CONTENT_TYPE_AUTH_REQUEST,
    CONTENT_TYPE_COMMAND_REPLY, CONTENT_TYPE_DISCONNECT, CONTENT_TYPE_EVENT_PLAIN,
};
