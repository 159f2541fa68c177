use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeasingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Empty catalog: {0}")]
    EmptyCatalog(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LeasingError {
    fn from(e: serde_json::Error) -> Self {
        LeasingError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for LeasingError {
    fn from(e: std::io::Error) -> Self {
        LeasingError::Io(e.to_string())
    }
}
