use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook endpoint returned status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid webhook URL '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Encoding(#[from] events::EventsError),
}
