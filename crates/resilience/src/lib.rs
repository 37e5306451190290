//! # Resilience
//!
//! A reusable circuit breaker for calls to external services (the data store
//! and the remote cache).
//!
//! ## Public API
//!
//! - `CircuitBreaker`: The three-state breaker, with `call(timeout, future)` as
//!   the usual entry point and `call_with` when only some errors mean the
//!   service is unhealthy.
//! - `BreakerConfig`: Failure ratio, rolling window, cooldown and probe settings.
//! - `BreakerError`: Distinguishes rejection, timeout and the wrapped call's own error.

pub mod breaker;
pub mod error;

pub use breaker::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use error::BreakerError;
