//! Long-lived event subscriber.
//!
//! The [`Subscriber`] owns the streaming control-plane session for the
//! process: one background task that connects, authenticates,
//! subscribes, decodes inbound events into the shared buffer, and
//! reconnects after a fixed delay whenever the session drops. It
//! retries forever; only [`Subscriber::stop`] ends the cycle.
//!
//! # State Machine
//!
//! ```text
//! Idle ──start()──► Connecting ──► Subscribing ──► Streaming
//!  ▲                    │                             │
//!  │                    │ failure              failure│peer close
//!  │                    ▼                             ▼
//!  └──stop()────── Disconnected ◄─────────────────────┘
//!                       │
//!                       └──(running, after delay)──► Connecting
//! ```
//!
//! Exactly one subscriber should exist per process. That is enforced
//! by ownership at the composition root, not by hidden global state:
//! construct one, share the handle.
//!
//! # Concurrency
//!
//! The background task is the only writer of the connection status
//! fields; readers take lock-free or short-lock snapshots and never
//! block the writer across I/O. Events are classified and buffered one
//! at a time, synchronously, before the next frame is read.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use eslwatch_core::{classify, EventBuffer, EventRecord, Severity};

use crate::client::EslClient;
use crate::config::SubscriberConfig;
use crate::gateway::CommandGateway;
use crate::protocol::{EslEvent, ProtocolResult};
use crate::status::StatusSnapshot;

/// Largest event count a reader may request in one call.
pub const MAX_READ_COUNT: usize = 1000;

/// How the streaming session ended.
enum SessionEnd {
    /// The peer closed the transport or sent a disconnect notice.
    PeerClosed,
    /// A stop request ended the session.
    Stopped,
}

/// State shared between the handle and the background task.
struct Shared {
    config: SubscriberConfig,
    buffer: EventBuffer,
    running: AtomicBool,
    connected: AtomicBool,
    connection_attempts: AtomicU64,
    last_error: Mutex<Option<String>>,
    last_event_time: Mutex<Option<DateTime<Utc>>>,
    stop: Notify,
}

impl Shared {
    fn set_last_error(&self, error: Option<String>) {
        *lock(&self.last_error) = error;
    }

    fn set_last_event_time(&self, time: DateTime<Utc>) {
        *lock(&self.last_event_time) = Some(time);
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn add_system(&self, subtype: &str, text: String, severity: Severity) {
        self.buffer.add(EventRecord::system(subtype, text, severity));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// The process-wide streaming event subscriber.
pub struct Subscriber {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    /// Creates a subscriber in the idle state. No connection is made
    /// until [`start`](Self::start).
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        let buffer = EventBuffer::new(config.buffer_capacity);
        Self {
            shared: Arc::new(Shared {
                config,
                buffer,
                running: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                connection_attempts: AtomicU64::new(0),
                last_error: Mutex::new(None),
                last_event_time: Mutex::new(None),
                stop: Notify::new(),
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawns the background task. Idempotent: a second call while
    /// running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(run(shared));
        *lock(&self.task) = Some(handle);
        info!(
            endpoint = %self.shared.config.host_port(),
            "event subscriber started"
        );
    }

    /// Requests shutdown and waits for the background task to exit.
    ///
    /// The stop signal force-closes a session blocked in the receive
    /// loop and cancels a pending reconnect wait. If the task has not
    /// exited within twice the reconnect delay it is aborted.
    pub async fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        // Wake a waiter currently parked in the receive loop or the
        // reconnect wait, and leave a permit for one about to park.
        self.shared.stop.notify_waiters();
        self.shared.stop.notify_one();

        let handle = lock(&self.task).take();
        if let Some(mut handle) = handle {
            let bound = self.shared.config.reconnect_delay * 2;
            if tokio::time::timeout(bound, &mut handle).await.is_err() {
                warn!("background task did not exit in time, aborting");
                handle.abort();
            }
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        info!("event subscriber stopped");
    }

    /// Returns up to the last `count` records, `count` clamped to
    /// `[1, 1000]`.
    #[must_use]
    pub fn events(&self, count: usize) -> Vec<Arc<EventRecord>> {
        self.shared.buffer.recent(count.clamp(1, MAX_READ_COUNT))
    }

    /// Returns records captured strictly after `epoch_secs`.
    #[must_use]
    pub fn events_since(&self, epoch_secs: f64) -> Vec<Arc<EventRecord>> {
        self.shared.buffer.since(epoch_secs)
    }

    /// Empties the buffer without affecting the connection.
    pub fn clear_buffer(&self) {
        self.shared.buffer.clear();
    }

    /// Takes a point-in-time snapshot of connection and buffer health.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.shared.connected.load(Ordering::SeqCst),
            host_port: self.shared.config.host_port(),
            running: self.shared.running(),
            last_error: lock(&self.shared.last_error).clone(),
            connection_attempts: self.shared.connection_attempts.load(Ordering::SeqCst),
            last_event_time: *lock(&self.shared.last_event_time),
            buffer_stats: self.shared.buffer.stats(),
            transport_available: true,
        }
    }

    /// A command gateway for the same endpoint. Each call opens its
    /// own short-lived session, independent of the streaming one.
    #[must_use]
    pub fn gateway(&self) -> CommandGateway {
        CommandGateway::new(self.shared.config.clone())
    }
}

/// Reconnect loop: one session per iteration, fixed delay between
/// attempts, forever until stopped.
async fn run(shared: Arc<Shared>) {
    while shared.running() {
        match run_session(&shared).await {
            Ok(SessionEnd::Stopped) => {}
            Ok(SessionEnd::PeerClosed) => {
                warn!("streaming session closed by peer");
                if shared.running() {
                    shared.add_system(
                        "DISCONNECTED",
                        format!("disconnected from {}", shared.config.host_port()),
                        Severity::Warning,
                    );
                }
            }
            Err(err) => {
                warn!(error = %err, "streaming session failed");
                shared.set_last_error(Some(err.to_string()));
                if shared.running() {
                    shared.add_system(
                        "ERROR",
                        format!("transport error: {err}"),
                        Severity::Error,
                    );
                }
            }
        }
        shared.connected.store(false, Ordering::SeqCst);

        if !shared.running() {
            break;
        }
        tokio::select! {
            () = tokio::time::sleep(shared.config.reconnect_delay) => {}
            () = shared.stop.notified() => break,
        }
    }
    shared.connected.store(false, Ordering::SeqCst);
    debug!("subscriber task exited");
}

/// One connect/subscribe/stream cycle.
async fn run_session(shared: &Shared) -> ProtocolResult<SessionEnd> {
    let config = &shared.config;
    let attempt = shared.connection_attempts.fetch_add(1, Ordering::SeqCst) + 1;
    info!(endpoint = %config.host_port(), attempt, "connecting");

    let mut client = EslClient::connect(
        &config.host,
        config.port,
        &config.password,
        config.connect_timeout,
    )
    .await?;
    client.subscribe_all().await?;

    shared.connected.store(true, Ordering::SeqCst);
    shared.set_last_error(None);
    shared.add_system(
        "CONNECTED",
        format!("connected to {}", config.host_port()),
        Severity::Info,
    );
    info!("connected and subscribed");

    loop {
        // The stop arm races the blocking read so a stop request takes
        // effect even while no frames are arriving.
        enum Step {
            Stop,
            Event(ProtocolResult<Option<EslEvent>>),
        }
        let step = tokio::select! {
            () = shared.stop.notified() => Step::Stop,
            event = client.next_event() => Step::Event(event),
        };
        match step {
            Step::Stop => {
                client.close().await;
                return Ok(SessionEnd::Stopped);
            }
            Step::Event(Ok(Some(event))) => {
                let record = classify(&event.headers, event.body.as_deref());
                debug!(
                    event_type = %record.event_type,
                    severity = %record.severity,
                    "event received"
                );
                shared.buffer.add(record);
                shared.set_last_event_time(Utc::now());
            }
            Step::Event(Ok(None)) => return Ok(SessionEnd::PeerClosed),
            Step::Event(Err(err)) if err.is_per_frame() => {
                warn!(error = %err, "dropping malformed frame");
            }
            Step::Event(Err(err)) => return Err(err),
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("endpoint", &self.shared.config.host_port())
            .field("running", &self.shared.running())
            .finish_non_exhaustive()
    }
}
