//! eslwatch-daemon - Event socket subscriber for a telephony switch.
//!
//! This crate keeps a persistent control-plane connection to the
//! switch's event socket, authenticates, subscribes to the event
//! stream, decodes inbound notifications into
//! [`EventRecord`](eslwatch_core::EventRecord)s, and buffers them for
//! retrieval. It recovers from disconnects on its own and exposes a
//! synchronous gateway for one-shot commands over independent
//! sessions.
//!
//! # Modules
//!
//! - [`protocol`]: wire codec, frame types, and protocol errors
//! - [`client`]: one authenticated session (connect, subscribe, api)
//! - [`subscriber`]: the long-lived reconnecting background task
//! - [`gateway`]: short-lived sessions for ad-hoc commands
//! - [`status`]: read-only health snapshot
//! - [`config`]: environment-sourced endpoint settings
//!
//! # Usage
//!
//! ```rust,ignore
//! use eslwatch_daemon::{Subscriber, SubscriberConfig};
//!
//! let subscriber = Subscriber::new(SubscriberConfig::from_env()?);
//! subscriber.start();
//! // ... later, from any task:
//! let recent = subscriber.events(50);
//! let status = subscriber.status();
//! subscriber.stop().await;
//! ```
//!
//! Exactly one [`Subscriber`] should exist per process; construct it
//! at the composition root and hand out references.

pub mod client;
pub mod config;
pub mod gateway;
pub mod protocol;
pub mod status;
pub mod subscriber;

pub use config::{ConfigError, SubscriberConfig};
pub use gateway::{CommandGateway, CommandOutcome};
pub use status::StatusSnapshot;
pub use subscriber::Subscriber;
