//! # Notifier
//!
//! Pushes analytics events to an HTTP webhook. `WebhookSink` implements
//! `events::PushSink`, so the worker can publish to it like any other sink.

use crate::error::NotifierError;
use events::{AnalyticsEvent, PushSink};
use reqwest::{Client, Url, header};
use std::time::Duration;
pub mod error;

/// A push sink that POSTs each event as JSON to a fixed URL.
///
/// `publish` spawns the request and returns immediately. A failed delivery is
/// logged and dropped; nothing is retried.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: Url,
}

impl WebhookSink {
    /// Creates a new `WebhookSink` whose requests give up after `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NotifierError> {
        let url = Url::parse(url).map_err(|_| NotifierError::InvalidUrl(url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifierError::InvalidUrl(url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Delivers one event and waits for the endpoint's answer.
    pub async fn deliver(&self, event: &AnalyticsEvent) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(event.to_json()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(NotifierError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl PushSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn publish(&self, event: AnalyticsEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(kind = %event.kind, "No async runtime available, webhook event dropped");
            return;
        };
        let sink = self.clone();
        runtime.spawn(async move {
            if let Err(e) = sink.deliver(&event).await {
                tracing::warn!(
                    kind = %event.kind,
                    user = %event.user_id,
                    error = %e,
                    "Failed to deliver webhook event"
                );
            }
        });
    }
}
