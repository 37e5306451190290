use std::time::Duration;
use thiserror::Error;

/// The outcome of a call that went through a [`crate::CircuitBreaker`].
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without running it.
    #[error("circuit breaker '{0}' is open")]
    Open(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The call ran and failed on its own.
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// A short, stable label for error counters.
    pub fn category(&self) -> &'static str {
        match self {
            BreakerError::Open(_) => "breaker_open",
            BreakerError::Timeout(_) => "timeout",
            BreakerError::Inner(_) => "call_failed",
        }
    }
}
