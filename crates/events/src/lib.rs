//! # Lineup Analytics Events
//!
//! This crate defines the real-time notifications pushed after fresh analytics
//! are persisted, and the sink abstraction they are pushed through.
//!
//! As a Layer 0 crate, it depends only on `core-types`. Transports that need
//! network access (such as the webhook sink) live in their own crates and
//! implement `PushSink`.

pub mod error;
pub mod messages;
pub mod sink;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::AnalyticsEvent;
pub use sink::{BroadcastSink, NoopSink, PushSink};
