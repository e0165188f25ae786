//! Event socket client sessions.
//!
//! [`EslClient`] wraps one authenticated TCP session to the switch.
//! Request/response operations (`auth`, `event`, `api`) are bounded by
//! the session timeout; only [`EslClient::next_event`] may wait
//! indefinitely, because the streaming receive loop races it against a
//! stop signal.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::protocol::{
    EslCodec, EslEvent, EslFrame, ProtocolError, ProtocolResult, CONTENT_TYPE_API_RESPONSE,
    CONTENT_TYPE_AUTH_REQUEST, CONTENT_TYPE_COMMAND_REPLY, CONTENT_TYPE_DISCONNECT,
    CONTENT_TYPE_EVENT_PLAIN,
};

/// One authenticated control-plane session.
pub struct EslClient {
    framed: Framed<TcpStream, EslCodec>,
    timeout: Duration,
}

impl EslClient {
    /// Opens a TCP session and authenticates with the shared secret.
    ///
    /// Every await in the sequence (connect, the peer's auth request,
    /// the credential exchange) is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::AuthRejected`] when the credential is
    /// refused, [`ProtocolError::Timeout`] when any step exceeds the
    /// bound, or the underlying transport error.
    pub async fn connect(
        host: &str,
        port: u16,
        password: &str,
        timeout: Duration,
    ) -> ProtocolResult<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| timeout_error(timeout))??;
        let framed = Framed::new(stream, EslCodec::new());
        let mut client = Self { framed, timeout };

        // The peer opens the conversation by requesting credentials.
        loop {
            let frame = client.recv().await?;
            match frame.content_type() {
                Some(CONTENT_TYPE_AUTH_REQUEST) => break,
                other => {
                    debug!(content_type = ?other, "skipping pre-auth frame");
                }
            }
        }

        let reply = client.command(&format!("auth {password}")).await?;
        if !reply.reply_ok() {
            return Err(ProtocolError::AuthRejected {
                reply: reply.reply_text().unwrap_or("").to_string(),
            });
        }
        Ok(client)
    }

    /// Subscribes this session to the full event stream.
    ///
    /// The switch delivers every class; the classifier decides what is
    /// rendered with family detail. Subscribing to everything avoids
    /// missing custom subclasses.
    pub async fn subscribe_all(&mut self) -> ProtocolResult<()> {
        let reply = self.command("event plain all").await?;
        if reply.reply_ok() {
            Ok(())
        } else {
            Err(ProtocolError::CommandRejected {
                reply: reply.reply_text().unwrap_or("").to_string(),
            })
        }
    }

    /// Executes one `api` command and returns its textual result.
    ///
    /// An empty body on a successful response yields an empty string.
    pub async fn api(&mut self, command: &str) -> ProtocolResult<String> {
        self.send(format!("api {command}")).await?;
        loop {
            let frame = self.recv().await?;
            match frame.content_type() {
                Some(CONTENT_TYPE_API_RESPONSE) => {
                    return Ok(frame.body.unwrap_or_default().trim().to_string());
                }
                Some(CONTENT_TYPE_DISCONNECT) => return Err(ProtocolError::ConnectionClosed),
                other => {
                    debug!(content_type = ?other, "skipping frame while awaiting api response");
                }
            }
        }
    }

    /// Waits for the next subscribed event.
    ///
    /// Returns `Ok(None)` when the peer closes the session, including
    /// via a disconnect notice. Frames whose event body cannot be
    /// parsed are logged and dropped without ending the session. This
    /// future is cancel-safe, so the receive loop can race it against
    /// a stop signal.
    pub async fn next_event(&mut self) -> ProtocolResult<Option<EslEvent>> {
        loop {
            let frame = match self.framed.next().await {
                None => return Ok(None),
                Some(Err(err)) => return Err(err),
                Some(Ok(frame)) => frame,
            };
            match frame.content_type() {
                Some(CONTENT_TYPE_EVENT_PLAIN) => {
                    let Some(body) = frame.body else {
                        warn!("event frame without body, dropping");
                        continue;
                    };
                    match EslEvent::parse_plain(&body) {
                        Ok(event) => return Ok(Some(event)),
                        Err(err) => {
                            warn!(error = %err, "dropping undecodable event frame");
                            continue;
                        }
                    }
                }
                Some(CONTENT_TYPE_DISCONNECT) => {
                    debug!("peer sent disconnect notice");
                    return Ok(None);
                }
                other => {
                    debug!(content_type = ?other, "ignoring non-event frame");
                }
            }
        }
    }

    /// Sends a command and waits for its `command/reply`.
    async fn command(&mut self, command: &str) -> ProtocolResult<EslFrame> {
        self.send(command.to_string()).await?;
        loop {
            let frame = self.recv().await?;
            match frame.content_type() {
                Some(CONTENT_TYPE_COMMAND_REPLY) => return Ok(frame),
                Some(CONTENT_TYPE_DISCONNECT) => return Err(ProtocolError::ConnectionClosed),
                other => {
                    debug!(content_type = ?other, "skipping frame while awaiting reply");
                }
            }
        }
    }

    async fn send(&mut self, command: String) -> ProtocolResult<()> {
        tokio::time::timeout(self.timeout, self.framed.send(command))
            .await
            .map_err(|_| timeout_error(self.timeout))?
    }

    async fn recv(&mut self) -> ProtocolResult<EslFrame> {
        match tokio::time::timeout(self.timeout, self.framed.next()).await {
            Err(_) => Err(timeout_error(self.timeout)),
            Ok(None) => Err(ProtocolError::ConnectionClosed),
            Ok(Some(result)) => result,
        }
    }

    /// Closes the session, telling the peer first on a best-effort
    /// basis.
    pub async fn close(mut self) {
        let farewell = tokio::time::timeout(
            Duration::from_millis(250),
            self.framed.send("exit".to_string()),
        )
        .await;
        if let Ok(Err(err)) = farewell {
            debug!(error = %err, "exit command failed during close");
        }
        let mut stream = self.framed.into_inner();
        let _ = stream.shutdown().await;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn timeout_error(bound: Duration) -> ProtocolError {
    ProtocolError::Timeout {
        duration_ms: bound.as_millis() as u64,
    }
}
