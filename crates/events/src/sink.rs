use crate::messages::AnalyticsEvent;
use core_types::{EventKind, UserId};
use serde_json::Value;
use tokio::sync::broadcast;

/// Where real-time analytics events go.
///
/// Delivery is best-effort and fire-and-forget: `publish` must not block, never
/// reports failure to the caller, and is never retried. The persisted record in
/// the data store stays authoritative.
pub trait PushSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn publish(&self, event: AnalyticsEvent);

    fn send_event(&self, kind: EventKind, user: &UserId, payload: Value) {
        self.publish(AnalyticsEvent::new(kind, user.clone(), payload));
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl PushSink for NoopSink {
    fn name(&self) -> &'static str {
        "none"
    }

    fn publish(&self, _event: AnalyticsEvent) {}
}

/// Fans events out to in-process subscribers (e.g. a WebSocket layer).
///
/// Slow subscribers lag and lose the oldest events; with no subscribers the
/// event is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<AnalyticsEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalyticsEvent> {
        self.tx.subscribe()
    }
}

impl PushSink for BroadcastSink {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn publish(&self, event: AnalyticsEvent) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            tracing::trace!(kind = %event.kind, user = %event.user_id, "No subscribers, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.send_event(EventKind::PredictionUpdate, &UserId::from("u1"), json!({"p": 1}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::PredictionUpdate);
        assert_eq!(event.user_id, UserId::from("u1"));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let sink = BroadcastSink::new(1);
        sink.send_event(EventKind::PerformanceUpdate, &UserId::from("u1"), Value::Null);
        NoopSink.send_event(EventKind::PerformanceUpdate, &UserId::from("u1"), Value::Null);
    }
}
