use crate::error::EventsError;
use chrono::{DateTime, Utc};
use core_types::{EventKind, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A real-time notification that fresh analytics are available for a user.
///
/// Serialized as a flat JSON object, for example:
/// `{
///   "kind": "performance_update",
///   "user_id": "u42",
///   "timestamp": "...",
///   "payload": { "roi": 0.12, ... }
/// }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl AnalyticsEvent {
    /// Creates an event stamped with the current time.
    pub fn new(kind: EventKind, user_id: UserId, payload: Value) -> Self {
        Self {
            kind,
            user_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn to_json(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serializes_with_snake_case_kind() {
        let event = AnalyticsEvent::new(
            EventKind::PortfolioUpdate,
            UserId::from("u42"),
            json!({ "expected_return": 0.01 }),
        );
        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["kind"], "portfolio_update");
        assert_eq!(value["user_id"], "u42");
        assert_eq!(value["payload"]["expected_return"], 0.01);
    }
}
