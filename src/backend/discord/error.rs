//! Error types shared by the Discord REST implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::backend::BackendError;

/// Convenient result alias returning [`DiscordError`] failures.
pub type DiscordResult<T> = Result<T, DiscordError>;

/// Failures that can occur while interacting with Discord.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// Required environment variable is missing.
    #[error("missing Discord environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Discord client")]
    ClientBuilder {
        /// Underlying reqwest failure.
        #[source]
        source: reqwest::Error,
    },
    /// The configured API root can't have path segments appended.
    #[error("invalid Discord API base `{api_base}`")]
    InvalidApiBase {
        /// Configured value.
        api_base: String,
    },
    /// A request could not be sent.
    #[error("failed to send Discord request to `{path}`")]
    RequestSend {
        /// Request path relative to the API root.
        path: String,
        /// Underlying reqwest failure.
        #[source]
        source: reqwest::Error,
    },
    /// Discord returned an unexpected status code.
    #[error("unexpected Discord response status {status} for `{path}`")]
    RequestStatus {
        /// Request path relative to the API root.
        path: String,
        /// Status Discord answered with.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode Discord response for `{path}`")]
    DecodeResponse {
        /// Request path relative to the API root.
        path: String,
        /// Underlying reqwest failure.
        #[source]
        source: reqwest::Error,
    },
    /// A snowflake in a response wasn't a valid integer.
    #[error("invalid snowflake `{value}` in Discord response for `{path}`")]
    InvalidSnowflake {
        /// Request path relative to the API root.
        path: String,
        /// Offending value.
        value: String,
    },
}

impl From<DiscordError> for BackendError {
    fn from(err: DiscordError) -> Self {
        BackendError::unavailable(err.to_string(), err)
    }
}
