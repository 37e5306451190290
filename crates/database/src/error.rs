use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },
}

impl DbError {
    /// A short, stable label for error counters.
    pub fn category(&self) -> &'static str {
        match self {
            DbError::ConnectionError(_) => "database",
            DbError::MigrationError(_) => "migration",
            DbError::JsonError(_) => "serialization",
            DbError::MalformedRow { .. } => "malformed_row",
        }
    }

    /// Whether the error says the database itself is unreachable or unhealthy,
    /// as opposed to one bad record or query.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DbError::ConnectionError(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Protocol(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            DbError::MigrationError(_) => true,
            DbError::JsonError(_) | DbError::MalformedRow { .. } => false,
        }
    }
}
