//! Error types for the extension handler.
//!
//! Step failures are not errors in this sense: a failing step declares its
//! outcome on the handler (see [`ExtensionHandler::perm_error`] and
//! [`ExtensionHandler::retry_error`]) and the retry policy in
//! [`ExtensionHandler::finish`] decides what the host sees. The variants here
//! cover misuse of the API and malformed collaborator input.
//!
//! [`ExtensionHandler::perm_error`]: crate::handler::ExtensionHandler::perm_error
//! [`ExtensionHandler::retry_error`]: crate::handler::ExtensionHandler::retry_error
//! [`ExtensionHandler::finish`]: crate::handler::ExtensionHandler::finish

use thiserror::Error;

/// The main error type for the extension handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A conditional step was configured without a handler to gate on.
    ///
    /// This is a programming error, never a retryable outcome.
    #[error("Must pass a handler of type ExtensionHandler to the conditional step wrapper")]
    MissingHandler,

    /// The invocation identifier is not of the form
    /// `<partition>:<service>:<region>:<account>:<resource>`.
    #[error("Invalid invocation ARN: {arn}")]
    InvalidArn {
        /// The identifier that failed to parse
        arn: String,
    },

    /// The repository identifier is not of the form `github.com/<owner>/<repo>`.
    #[error("Invalid repository identifier: {repo}")]
    InvalidRepository {
        /// The identifier that failed to parse
        repo: String,
    },

    /// Validation error for invalid configuration or arguments.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    SerDes {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl HandlerError {
    /// Creates a new InvalidArn error.
    pub fn invalid_arn(arn: impl Into<String>) -> Self {
        Self::InvalidArn { arn: arn.into() }
    }

    /// Creates a new InvalidRepository error.
    pub fn invalid_repository(repo: impl Into<String>) -> Self {
        Self::InvalidRepository { repo: repo.into() }
    }

    /// Creates a new Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new SerDes error.
    pub fn serdes(message: impl Into<String>) -> Self {
        Self::SerDes {
            message: message.into(),
        }
    }

    /// Returns true if this error signals misuse of the step wrapper.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::MissingHandler)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::serdes(error.to_string())
    }
}

/// Result alias used throughout the crate.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_handler_is_misuse() {
        let error = HandlerError::MissingHandler;
        assert!(error.is_misuse());
        assert!(error.to_string().contains("ExtensionHandler"));
    }

    #[test]
    fn test_validation_error() {
        let error = HandlerError::validation("bad progress");
        assert!(matches!(error, HandlerError::Validation { .. }));
        assert!(!error.is_misuse());
        assert_eq!(error.to_string(), "Validation error: bad progress");
    }

    #[test]
    fn test_invalid_arn_display() {
        let error = HandlerError::invalid_arn("not-an-arn");
        assert_eq!(error.to_string(), "Invalid invocation ARN: not-an-arn");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<String>("invalid").unwrap_err();
        let error: HandlerError = json_error.into();
        assert!(matches!(error, HandlerError::SerDes { .. }));
    }
}
