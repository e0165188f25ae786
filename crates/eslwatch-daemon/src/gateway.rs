//! Ad-hoc command execution.
//!
//! Each [`CommandGateway::send_command`] call opens its own short-lived
//! session (connect, authenticate, one `api` round trip, close), so
//! commands never contend with the streaming session and may run
//! concurrently with each other. The entire call, connection setup
//! included, is capped by the configured command timeout; a command
//! that never completes reports failure instead of hanging the caller.
//!
//! Which command texts are permitted is the caller's policy. This
//! layer executes what it is given.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::EslClient;
use crate::config::SubscriberConfig;
use crate::protocol::ProtocolResult;

/// Result of one ad-hoc command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Whether the command completed.
    pub success: bool,
    /// Textual result; empty string when the peer returned success
    /// with no payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    fn ok(output: String) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error),
        }
    }
}

/// Executes one-shot commands against the switch.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    config: SubscriberConfig,
}

impl CommandGateway {
    /// Creates a gateway for the configured endpoint.
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        Self { config }
    }

    /// Runs one command and returns its outcome.
    ///
    /// Never panics and never returns an error type: transport and
    /// protocol failures are folded into a failed outcome for the
    /// caller to surface.
    pub async fn send_command(&self, command: &str) -> CommandOutcome {
        debug!(command, "executing ad-hoc command");
        let bound = self.config.command_timeout;
        match tokio::time::timeout(bound, self.execute(command)).await {
            Ok(Ok(output)) => CommandOutcome::ok(output),
            Ok(Err(err)) => {
                warn!(command, error = %err, "command failed");
                CommandOutcome::failed(err.to_string())
            }
            Err(_) => {
                warn!(command, timeout_ms = bound.as_millis() as u64, "command timed out");
                CommandOutcome::failed(format!(
                    "command timed out after {} ms",
                    bound.as_millis()
                ))
            }
        }
    }

    async fn execute(&self, command: &str) -> ProtocolResult<String> {
        let mut client = EslClient::connect(
            &self.config.host,
            self.config.port,
            &self.config.password,
            self.config.command_timeout,
        )
        .await?;
        let output = client.api(command).await?;
        client.close().await;
        Ok(output)
    }
}
