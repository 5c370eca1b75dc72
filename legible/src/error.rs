use thiserror::Error;

#[derive(Error, Debug)]
pub enum LegibleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("No text detected in image")]
    NoTextDetected,

    #[error("Payload too large: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Remote OCR transport error: {0}")]
    RemoteTransport(String),

    #[error("Remote OCR returned HTTP {status}: {message}")]
    RemoteHttp { status: u16, message: String },

    #[error("Remote OCR could not process image: {0}")]
    RemoteProcessing(String),

    #[error("Recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for LegibleError {
    fn from(err: tokio::task::JoinError) -> Self {
        LegibleError::Internal(format!("Blocking task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, LegibleError>;
