use std::error::Error;
use thiserror::Error;

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error raised by messaging backends regardless of the underlying service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service could not be reached or answered with an error.
    #[error("chat backend unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The request was refused before reaching the service.
    #[error("chat backend rejected request: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        BackendError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
