//! Incremental frame codec for the event socket protocol.
//!
//! Decodes header blocks terminated by a blank line, followed by
//! exactly the announced `Content-Length` body bytes when present.
//! The announced length is validated against [`MAX_FRAME_SIZE`] before
//! any allocation, and header scanning is bounded by
//! [`MAX_HEADER_BLOCK_SIZE`], mirroring the size-before-allocation
//! discipline of length-prefixed codecs.

use std::collections::BTreeMap;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::{ProtocolError, MAX_FRAME_SIZE, MAX_HEADER_BLOCK_SIZE};
use super::frame::{parse_header_block, EslFrame};

enum DecodeState {
    /// Scanning for the blank line that ends the header block.
    Headers,
    /// Headers parsed; waiting for `remaining` body bytes.
    Body {
        headers: BTreeMap<String, String>,
        remaining: usize,
    },
}

/// Codec translating between byte streams and [`EslFrame`]s.
///
/// Outbound commands are encoded as the command text followed by the
/// double-newline terminator.
pub struct EslCodec {
    state: DecodeState,
    max_frame: usize,
}

impl EslCodec {
    /// Creates a codec with the default size bounds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecodeState::Headers,
            max_frame: MAX_FRAME_SIZE,
        }
    }
}

impl Default for EslCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn find_blank_line(src: &[u8]) -> Option<usize> {
    src.windows(2).position(|window| window == b"\n\n")
}

impl Decoder for EslCodec {
    type Item = EslFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<EslFrame>, ProtocolError> {
        loop {
            match &mut self.state {
                DecodeState::Headers => {
                    let Some(pos) = find_blank_line(src) else {
                        if src.len() > MAX_HEADER_BLOCK_SIZE {
                            return Err(ProtocolError::InvalidFrame {
                                reason: format!(
                                    "header block exceeds {MAX_HEADER_BLOCK_SIZE} bytes \
                                     without terminator"
                                ),
                            });
                        }
                        return Ok(None);
                    };
                    let block = src.split_to(pos);
                    src.advance(2); // the "\n\n" terminator
                    let text = String::from_utf8_lossy(&block);
                    let headers = parse_header_block(&text)?;

                    let Some(length) = headers.get("Content-Length") else {
                        return Ok(Some(EslFrame { headers, body: None }));
                    };
                    let length: usize =
                        length
                            .parse()
                            .map_err(|_| ProtocolError::InvalidFrame {
                                reason: format!("unparsable Content-Length: {length:?}"),
                            })?;
                    if length > self.max_frame {
                        return Err(ProtocolError::FrameTooLarge {
                            size: length,
                            max: self.max_frame,
                        });
                    }
                    self.state = DecodeState::Body {
                        headers,
                        remaining: length,
                    };
                }
                DecodeState::Body { headers, remaining } => {
                    if src.len() < *remaining {
                        let shortfall = *remaining - src.len();
                        src.reserve(shortfall);
                        return Ok(None);
                    }
                    let body = src.split_to(*remaining);
                    let body = String::from_utf8_lossy(&body).into_owned();
                    let headers = std::mem::take(headers);
                    self.state = DecodeState::Headers;
                    return Ok(Some(EslFrame {
                        headers,
                        body: Some(body),
                    }));
                }
            }
        }
    }
}

impl Encoder<String> for EslCodec {
    type Error = ProtocolError;

    fn encode(&mut self, command: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(command.len() + 2);
        dst.extend_from_slice(command.as_bytes());
        dst.extend_from_slice(b"\n\n");
        Ok(())
    }
}
