//! Frame and event types for the event socket protocol.

use std::collections::BTreeMap;

use super::error::{ProtocolError, ProtocolResult};

/// Content type sent by the peer immediately after connect.
pub const CONTENT_TYPE_AUTH_REQUEST: &str = "auth/request";
/// Content type of a reply to a session command.
pub const CONTENT_TYPE_COMMAND_REPLY: &str = "command/reply";
/// Content type of an `api` command result.
pub const CONTENT_TYPE_API_RESPONSE: &str = "api/response";
/// Content type of a subscribed event delivered in plain format.
pub const CONTENT_TYPE_EVENT_PLAIN: &str = "text/event-plain";
/// Content type announcing that the peer is about to close.
pub const CONTENT_TYPE_DISCONNECT: &str = "text/disconnect-notice";

/// One wire frame: a header block plus optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EslFrame {
    /// Decoded header mapping.
    pub headers: BTreeMap<String, String>,
    /// Body bytes as text, present when `Content-Length` was announced.
    pub body: Option<String>,
}

impl EslFrame {
    /// Looks up a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The frame's `Content-Type`, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// The `Reply-Text` header of a command reply, if any.
    #[must_use]
    pub fn reply_text(&self) -> Option<&str> {
        self.header("Reply-Text")
    }

    /// True when this is a command reply carrying `+OK`.
    #[must_use]
    pub fn reply_ok(&self) -> bool {
        self.reply_text().is_some_and(|text| text.starts_with("+OK"))
    }
}

/// One decoded inbound event: the inner header map of a
/// `text/event-plain` frame, plus its optional free-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EslEvent {
    /// Event header mapping (`Event-Name`, `Event-Subclass`, ...).
    pub headers: BTreeMap<String, String>,
    /// Free-text payload (log lines), if present.
    pub body: Option<String>,
}

impl EslEvent {
    /// Parses the body of a `text/event-plain` frame.
    ///
    /// The body is itself a header block; anything after the first
    /// blank line is the event's own payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidFrame`] when a header line has
    /// no separating colon. One undecodable event never terminates the
    /// session; the caller drops the frame and keeps reading.
    pub fn parse_plain(text: &str) -> ProtocolResult<Self> {
        let (head, rest) = match text.split_once("\n\n") {
            Some((head, rest)) => (head, Some(rest)),
            None => (text, None),
        };
        let headers = parse_header_block(head)?;
        let body = rest
            .map(|rest| rest.trim_end_matches('\n'))
            .filter(|rest| !rest.is_empty())
            .map(String::from);
        Ok(Self { headers, body })
    }

    /// The `Event-Name` header, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.headers.get("Event-Name").map(String::as_str)
    }
}

/// Parses a block of `Name: value` lines into a map.
///
/// Blank lines are skipped; a non-blank line without a colon is a
/// framing error. Values keep their wire form (URL-encoded values are
/// treated as opaque text).
pub fn parse_header_block(block: &str) -> ProtocolResult<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(ProtocolError::InvalidFrame {
                reason: format!("header line without colon: {line:?}"),
            });
        };
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}
