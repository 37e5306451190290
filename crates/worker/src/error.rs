use analytics::AnalyticsError;
use database::DbError;
use resilience::BreakerError;
use thiserror::Error;

/// Lifecycle misuse and shutdown failures reported by [`crate::AnalyticsWorker`].
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("The analytics worker is already running")]
    AlreadyRunning,

    #[error("The analytics worker is not running")]
    NotRunning,

    #[error("The analytics worker must be started inside a Tokio runtime")]
    NoRuntime,

    #[error("{0} worker task(s) ended abnormally")]
    TaskFailed(usize),
}

/// Why one unit of work inside a cycle failed.
///
/// These never escape a cycle: they are logged, counted by [`TaskError::category`],
/// and the cycle moves on.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Data store call failed: {0}")]
    Store(#[from] BreakerError<DbError>),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Failed to encode push payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl TaskError {
    /// A short, stable label for error counters.
    pub fn category(&self) -> &'static str {
        match self {
            TaskError::Store(BreakerError::Inner(db)) => db.category(),
            TaskError::Store(other) => other.category(),
            TaskError::Analytics(AnalyticsError::NotEnoughData(_)) => "not_enough_data",
            TaskError::Analytics(AnalyticsError::InvalidMatrix(_)) => "invalid_matrix",
            TaskError::Payload(_) => "payload",
        }
    }
}
