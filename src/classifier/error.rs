use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model must be trained before use")]
    Untrained,

    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("artifact format mismatch: expected {expected}, found {found}")]
    FormatMismatch { expected: String, found: String },

    #[error("artifact checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("corrupt artifact: {0}")]
    Corrupt(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
