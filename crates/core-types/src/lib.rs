pub mod enums;
pub mod error;
pub mod ids;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{EventKind, TaskKind};
pub use error::CoreError;
pub use ids::{LineupId, UserId};
pub use series::{ReturnSample, ReturnSeries, TimeWindow};
