//! Configuration for the extension handler.
//!
//! The handler has exactly two knobs: what to do when an invocation reaches
//! [`finish`](crate::handler::ExtensionHandler::finish) without any step
//! declaring an outcome, and how many times a single error code may be retried
//! before it is surfaced as final.

use serde::{Deserialize, Serialize};

/// Default cap on retry attempts for any single error code.
pub const DEFAULT_MAX_RETRIES_PER_ERROR_CODE: u32 = 6;

/// Configuration for an [`ExtensionHandler`](crate::handler::ExtensionHandler).
///
/// # Example
///
/// ```
/// use extension_handler::HandlerConfig;
///
/// let config = HandlerConfig::default();
/// assert!(config.ignore_undeclared_return);
/// assert_eq!(config.max_retries_per_error_code, 6);
///
/// let strict = HandlerConfig::strict().with_max_retries_per_error_code(3);
/// assert!(!strict.ignore_undeclared_return);
/// assert_eq!(strict.max_retries_per_error_code, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Treat an invocation that finishes without a declared outcome as an
    /// implicit success instead of a `no_success_or_error` failure.
    pub ignore_undeclared_return: bool,
    /// Attempts allowed for one error code before it becomes permanent.
    pub max_retries_per_error_code: u32,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            ignore_undeclared_return: true,
            max_retries_per_error_code: DEFAULT_MAX_RETRIES_PER_ERROR_CODE,
        }
    }
}

impl HandlerConfig {
    /// Creates a new HandlerConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that fails invocations which never declare an outcome.
    pub fn strict() -> Self {
        Self {
            ignore_undeclared_return: false,
            ..Default::default()
        }
    }

    /// Sets the ignore_undeclared_return option.
    pub fn with_ignore_undeclared_return(mut self, ignore: bool) -> Self {
        self.ignore_undeclared_return = ignore;
        self
    }

    /// Sets the per-error-code retry cap.
    pub fn with_max_retries_per_error_code(mut self, max_retries: u32) -> Self {
        self.max_retries_per_error_code = max_retries;
        self
    }
}
