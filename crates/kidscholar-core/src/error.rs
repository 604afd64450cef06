//! Error types for the kidscholar core library.

use thiserror::Error;

/// Reasons the profile-setup flow refuses to continue or submit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Please tell us your name")]
    MissingName,

    #[error("Please tell us your age")]
    MissingAge,

    #[error("Please select your grade level")]
    MissingGradeLevel,

    #[error("Please enter your API base URL and key")]
    MissingCredentials,
}

/// A shared error type for the kidscholar library.
#[derive(Error, Debug)]
pub enum LearnError {
    /// No API key is configured; raised before any network call.
    #[error("API key is not set")]
    MissingCredentials,

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The completion endpoint answered with a non-2xx status.
    #[error("Completion endpoint error {status}: {message}")]
    Endpoint { status: u16, message: String },

    /// The endpoint answered 2xx but carried no choices.
    #[error("Completion endpoint returned no choices")]
    EmptyCompletion,

    /// Model output could not be decoded into the expected structure.
    #[error("Malformed {expected} in model response: {detail}")]
    MalformedResponse {
        expected: &'static str,
        detail: String,
    },

    /// Persistent storage failure (file system operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error outside of model output
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

impl LearnError {
    pub fn malformed(expected: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            expected,
            detail: detail.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingCredentials)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse { .. })
    }

    /// True for failures reaching or talking to the endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Endpoint { .. } | Self::EmptyCompletion
        )
    }
}

impl From<std::io::Error> for LearnError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for LearnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for LearnError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A type alias for `Result<T, LearnError>`.
pub type Result<T> = std::result::Result<T, LearnError>;
