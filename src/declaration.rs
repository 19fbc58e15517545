//! The argument set of a terminal declaration.

use serde_json::{Map, Value};

/// Status code recorded by a declaration unless one is given.
pub const DEFAULT_STATUS_CODE: u16 = 200;

/// A terminal outcome to record with
/// [`ExtensionHandler::declare_return`](crate::handler::ExtensionHandler::declare_return).
///
/// Every container field is a fresh value per declaration; nothing is shared
/// between calls.
///
/// # Example
///
/// ```
/// use extension_handler::Declaration;
/// use serde_json::json;
///
/// let declaration = Declaration::new(60)
///     .error_code("throttled")
///     .error_details(json!({"retry_after": 5}))
///     .callback_sec(5);
/// assert_eq!(declaration.progress, 60);
/// assert!(declaration.callback);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Status code of the outcome
    pub status_code: u16,
    /// Progress percentage, 0 to 100
    pub progress: u8,
    /// Explicit success flag
    pub success: Option<bool>,
    /// Props merged into the accumulated props
    pub props: Map<String, Value>,
    /// Links merged into the accumulated links
    pub links: Map<String, Value>,
    /// Error code
    pub error_code: Option<String>,
    /// Structured diagnostic payload
    pub error_details: Option<Value>,
    /// Whether the host should re-invoke
    pub callback: bool,
    /// Requested delay before re-invocation; 0 lets the retry policy decide
    pub callback_sec: u64,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            status_code: DEFAULT_STATUS_CODE,
            progress: 0,
            success: None,
            props: Map::new(),
            links: Map::new(),
            error_code: None,
            error_details: None,
            callback: true,
            callback_sec: 0,
        }
    }
}

impl Declaration {
    /// Creates a declaration at the given progress.
    pub fn new(progress: u8) -> Self {
        Self {
            progress,
            ..Default::default()
        }
    }

    /// A successful, finished outcome.
    pub fn success() -> Self {
        Self {
            progress: 100,
            success: Some(true),
            ..Default::default()
        }
    }

    /// Sets the status code.
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Sets the explicit success flag.
    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Sets the error code.
    pub fn error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// Sets the structured error details.
    pub fn error_details(mut self, details: Value) -> Self {
        self.error_details = Some(details);
        self
    }

    /// Adds props to merge on declaration.
    pub fn props(mut self, props: Map<String, Value>) -> Self {
        self.props.extend(props);
        self
    }

    /// Adds links to merge on declaration.
    pub fn links(mut self, links: Map<String, Value>) -> Self {
        self.links.extend(links);
        self
    }

    /// Sets whether the host should re-invoke.
    pub fn callback(mut self, callback: bool) -> Self {
        self.callback = callback;
        self
    }

    /// Sets the requested delay before re-invocation.
    pub fn callback_sec(mut self, callback_sec: u64) -> Self {
        self.callback_sec = callback_sec;
        self
    }
}
