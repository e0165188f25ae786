//! Subscriber configuration.
//!
//! The only environment coupling this subsystem has: remote host,
//! port, and shared-secret credential, with the conventional defaults
//! of a local switch. Everything else is tunable through the builder
//! methods, which the tests use to shrink the timing bounds.

use std::env;
use std::time::Duration;

use thiserror::Error;

use eslwatch_core::DEFAULT_BUFFER_CAPACITY;

/// Environment variable naming the switch host.
pub const ENV_HOST: &str = "ESL_HOST";
/// Environment variable naming the switch event socket port.
pub const ENV_PORT: &str = "ESL_PORT";
/// Environment variable naming the shared secret.
pub const ENV_PASSWORD: &str = "ESL_PASSWORD";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8021;
const DEFAULT_PASSWORD: &str = "ClueCon";

/// Delay between reconnect attempts.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Bound on each step of connect/authenticate/subscribe.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Hard cap on one ad-hoc command round trip.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The port variable did not parse as a TCP port.
    #[error("invalid {ENV_PORT} value: {value:?}")]
    InvalidPort {
        /// The offending value.
        value: String,
    },

    /// The password variable was set but empty.
    #[error("{ENV_PASSWORD} must not be empty")]
    EmptyPassword,
}

/// Settings for the subscriber and command gateway.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Switch host.
    pub host: String,
    /// Event socket port.
    pub port: u16,
    /// Shared-secret credential.
    pub password: String,
    /// Ring buffer capacity.
    pub buffer_capacity: usize,
    /// Wait between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Bound on connect/authenticate/subscribe steps.
    pub connect_timeout: Duration,
    /// Hard cap on one ad-hoc command, connection included.
    pub command_timeout: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: DEFAULT_PASSWORD.to_string(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl SubscriberConfig {
    /// Builds a config from the environment, applying defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a set variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(host) = env::var(ENV_HOST) {
            if !host.is_empty() {
                config.host = host;
            }
        }
        if let Ok(port) = env::var(ENV_PORT) {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
        }
        if let Ok(password) = env::var(ENV_PASSWORD) {
            if password.is_empty() {
                return Err(ConfigError::EmptyPassword);
            }
            config.password = password;
        }
        Ok(config)
    }

    /// Creates a config for an explicit endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Self::default()
        }
    }

    /// Overrides the ring buffer capacity.
    #[must_use]
    pub const fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Overrides the reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Overrides the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the command timeout.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// The `host:port` rendering used in status and log output.
    #[must_use]
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
