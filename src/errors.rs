/*!
 * Error types for the gstl application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Map an HTTP status and body to the matching provider error
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether the credential behind the failing call is unusable
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur during a translation run
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The response did not contain a decodable JSON array
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The response decoded but has the wrong number of entries
    #[error("Wrong number of translations: sent {expected}, received {received}")]
    CardinalityMismatch {
        /// Records sent in the batch
        expected: usize,
        /// Objects in the response
        received: usize,
    },

    /// The response refers to an index that was not part of the batch
    #[error("Response refers to index {0} which is not part of the batch")]
    UnknownIndex(u64),

    /// The response repeats an index
    #[error("Response repeats index {0}")]
    DuplicateIndex(u64),

    /// Every worker stopped before all batches were completed
    #[error("All workers stopped after {completed} of {total} batches; progress kept in {checkpoint:?}")]
    WorkersExhausted {
        /// Batches merged before the collapse
        completed: usize,
        /// Batches dispatched
        total: usize,
        /// Checkpoint holding the latest buffer
        checkpoint: PathBuf,
    },

    /// Checkpoint could not be written or read
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Source data is unusable
    #[error("Input error: {0}")]
    Input(String),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Input(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fromStatus_withUnauthorized_shouldBeCredentialFailure() {
        let error = ProviderError::from_status(401, "bad key".to_string());
        assert!(error.is_credential_failure());
    }

    #[test]
    fn test_fromStatus_withTooManyRequests_shouldBeRateLimit() {
        let error = ProviderError::from_status(429, "slow down".to_string());
        assert!(matches!(error, ProviderError::RateLimitExceeded(_)));
        assert!(!error.is_credential_failure());
    }

    #[test]
    fn test_cardinalityMismatch_display_shouldNameBothCounts() {
        let error = TranslationError::CardinalityMismatch { expected: 5, received: 4 };
        assert_eq!(error.to_string(), "Wrong number of translations: sent 5, received 4");
    }
}
