//! eslwatch-core - Event records, classification, and buffering.
//!
//! This crate holds the pure domain layer of the eslwatch event
//! subscriber: the normalized [`EventRecord`] type, the deterministic
//! [`classify`] function that turns a raw switch event into a record,
//! and the thread-safe bounded [`EventBuffer`] the subscriber publishes
//! into.
//!
//! Nothing in this crate performs I/O or depends on an async runtime.
//! The transport and connection lifecycle live in `eslwatch-daemon`.
//!
//! # Data Flow
//!
//! ```text
//! raw event headers + body
//!         │
//!         ▼
//!     classify()          pure, deterministic
//!         │
//!         ▼
//!     EventRecord          immutable once created
//!         │
//!         ▼
//!     EventBuffer          fixed capacity, oldest evicted
//! ```

pub mod buffer;
pub mod classify;
pub mod record;

pub use buffer::{BufferStats, EventBuffer, DEFAULT_BUFFER_CAPACITY};
pub use classify::{classify, SUBSCRIBED_EVENTS};
pub use record::{EventDetails, EventRecord, Severity};
