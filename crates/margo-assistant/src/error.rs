use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Request(String),

    #[error("assistant stream failed: {0}")]
    Stream(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("http client error: {0}")]
    Client(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
