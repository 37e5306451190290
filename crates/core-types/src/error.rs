use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown task kind: {0}")]
    UnknownTask(String),
}
