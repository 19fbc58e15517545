//! The resumable operation handler.
//!
//! One [`ExtensionHandler`] lives for exactly one invocation. It is rebuilt
//! from the previous invocation's continuation payload, mutated synchronously
//! by the steps that run, and turned into a [`Response`] by [`finish`].
//!
//! Two invocations of the same job must never run against the same
//! continuation payload at once; the handler has no way to detect it.
//!
//! [`finish`]: ExtensionHandler::finish

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::HandlerConfig;
use crate::declaration::Declaration;
use crate::error::HandlerResult;
use crate::log::{gen_log, LogRecord};
use crate::response::Response;
use crate::state::{Ops, PassBackData, Retries};

/// Error code synthesized when a strict handler finishes without an outcome.
pub const NO_SUCCESS_OR_ERROR: &str = "no_success_or_error";

/// Key under which a host event carries the continuation payload.
pub const PASS_BACK_DATA_KEY: &str = "pass_back_data";

/// State machine for one invocation of a resumable job.
///
/// # Example
///
/// ```
/// use extension_handler::{ExtensionHandler, HandlerConfig};
/// use serde_json::json;
///
/// let event = json!({"pass_back_data": {"ops": {"upload": true}}});
/// let mut handler = ExtensionHandler::new(HandlerConfig::default());
/// handler.declare_pass_back_data_from_event(&event).unwrap();
///
/// handler.run_step(Some("upload"), true, |h| {
///     h.add_props([("bucket", json!("artifacts"))]);
/// });
/// assert!(handler.ops().is_empty());
///
/// let response = handler.finish();
/// assert_eq!(response.success, Some(true));
/// assert_eq!(response.progress, Some(100));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionHandler {
    config: HandlerConfig,
    pub(crate) logs: Vec<LogRecord>,
    pub(crate) ops: Ops,
    pub(crate) retries: Retries,
    pub(crate) props: Map<String, Value>,
    pub(crate) links: Map<String, Value>,
    pub(crate) ret: bool,
    pub(crate) status_code: Option<u16>,
    pub(crate) progress: Option<u8>,
    pub(crate) success: Option<bool>,
    pub(crate) error: Option<String>,
    pub(crate) error_details: Option<Value>,
    pub(crate) callback: Option<bool>,
    pub(crate) callback_sec: u64,
}

impl Default for ExtensionHandler {
    fn default() -> Self {
        Self::new(HandlerConfig::default())
    }
}

impl ExtensionHandler {
    /// Creates a handler with empty state.
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            config,
            logs: Vec::new(),
            ops: Ops::new(),
            retries: Retries::new(),
            props: Map::new(),
            links: Map::new(),
            ret: false,
            status_code: None,
            progress: None,
            success: None,
            error: None,
            error_details: None,
            callback: None,
            callback_sec: 0,
        }
    }

    /// Resets every field to empty/unset. The configuration is kept.
    pub fn refresh(&mut self) {
        *self = Self::new(self.config);
    }

    /// Returns the handler configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    // ========================================================================
    // Restoring state
    // ========================================================================

    /// Restores carried state from the previous invocation's payload.
    pub fn declare_pass_back_data(&mut self, data: PassBackData) {
        let PassBackData {
            ops,
            retries,
            props,
            links,
        } = data;
        debug!(
            ops = ?ops,
            retries = ?retries,
            links = ?links,
            props = ?props,
            "Restored pass back data"
        );
        self.ops = ops;
        self.retries = retries;
        self.props = props;
        self.links = links;
    }

    /// Restores carried state from a raw JSON payload.
    ///
    /// A missing or `null` payload restores empty state.
    pub fn declare_pass_back_data_value(&mut self, data: Option<&Value>) -> HandlerResult<()> {
        let data = PassBackData::from_value(data)?;
        self.declare_pass_back_data(data);
        Ok(())
    }

    /// Restores carried state from the `pass_back_data` key of a host event.
    pub fn declare_pass_back_data_from_event(&mut self, event: &Value) -> HandlerResult<()> {
        self.declare_pass_back_data_value(event.get(PASS_BACK_DATA_KEY))
    }

    // ========================================================================
    // Operation tracking
    // ========================================================================

    /// Marks an operation as pending with `true` as its value.
    pub fn add_op(&mut self, name: impl Into<String>) {
        self.add_op_with_value(name, Value::Bool(true));
    }

    /// Marks an operation as pending, overwriting any previous value.
    pub fn add_op_with_value(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!(op = %name, value = %value, "Adding op");
        self.ops.insert(name, value);
    }

    /// Removes an operation from the pending set. Absent names are ignored.
    pub fn complete_op(&mut self, name: &str) {
        debug!(op = %name, "Completing op");
        self.ops.remove(name);
    }

    // ========================================================================
    // Metadata accumulation
    // ========================================================================

    /// Merges entries into the props, overwriting on collision, and returns
    /// the full props.
    pub fn add_props<I, K>(&mut self, props: I) -> &Map<String, Value>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        merge_into(&mut self.props, props);
        &self.props
    }

    /// Merges entries into the links, overwriting on collision, and returns
    /// the full links.
    pub fn add_links<I, K>(&mut self, links: I) -> &Map<String, Value>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        merge_into(&mut self.links, links);
        &self.links
    }

    // ========================================================================
    // Logging
    // ========================================================================

    /// Appends a user-visible log record stamped with the current time.
    pub fn add_log(&mut self, title: impl Into<String>, details: Value, is_error: bool) {
        let record = gen_log(title, details, is_error);
        if is_error {
            warn!(title = %record.title, "Adding error log");
        } else {
            debug!(title = %record.title, "Adding log");
        }
        self.logs.push(record);
    }

    // ========================================================================
    // Declaring outcomes
    // ========================================================================

    /// Records the terminal outcome of this invocation.
    ///
    /// A second declaration overwrites the first; props and links from both
    /// are kept. Only the conditional step wrapper stops later steps from
    /// declaring again.
    pub fn declare_return(&mut self, declaration: Declaration) {
        let Declaration {
            status_code,
            progress,
            success,
            props,
            links,
            error_code,
            error_details,
            callback,
            callback_sec,
        } = declaration;

        if self.ret {
            warn!("Terminal outcome declared more than once; overwriting");
        }
        debug!(?success, error_code = ?error_code, "Declaring return");

        let progress = if progress > 100 {
            warn!(progress, "Progress above 100, clamping");
            100
        } else {
            progress
        };

        self.status_code = Some(status_code);
        self.progress = Some(progress);
        self.success = success;
        self.error = error_code;
        self.props.extend(props);
        self.links.extend(links);
        self.callback = Some(callback);
        self.callback_sec = callback_sec;
        self.error_details = error_details;
        self.ret = true;
    }

    /// Declares an error the host must never retry.
    pub fn perm_error(&mut self, error: impl Into<String>, progress: u8) {
        self.declare_return(Declaration::new(progress).error_code(error).callback(false));
    }

    /// Declares an error subject to the retry/backoff policy.
    ///
    /// A `callback_sec` of 0 lets [`finish`](Self::finish) pick the backoff.
    pub fn retry_error(&mut self, error: impl Into<String>, progress: u8, callback_sec: u64) {
        self.declare_return(
            Declaration::new(progress)
                .error_code(error)
                .callback_sec(callback_sec),
        );
    }

    // ========================================================================
    // Finish
    // ========================================================================

    /// Applies the retry policy and assembles the response for the host.
    pub fn finish(&mut self) -> Response {
        let mut pass_back_data = None;

        if let Some(error) = self.error.clone() {
            let attempts = self
                .retries
                .get(&error)
                .copied()
                .unwrap_or(0)
                .saturating_add(1);
            self.retries.insert(error.clone(), attempts);

            pass_back_data = Some(PassBackData {
                ops: self.ops.clone(),
                retries: self.retries.clone(),
                props: self.props.clone(),
                links: self.links.clone(),
            });

            let callback = self.callback.unwrap_or(false);
            if attempts < self.config.max_retries_per_error_code && callback {
                self.error = None;
                self.error_details = None;
                if self.callback_sec == 0 {
                    self.callback_sec = backoff_seconds(attempts);
                }
                info!(
                    error = %error,
                    attempts,
                    callback_sec = self.callback_sec,
                    "Retryable error, scheduling callback"
                );
            } else {
                warn!(error = %error, attempts, callback, "Surfacing error as final");
            }
        } else if self.success.is_none() && !self.config.ignore_undeclared_return {
            warn!("Finish called without a declared outcome");
            self.error = Some(NO_SUCCESS_OR_ERROR.to_string());
            self.error_details = Some(json!({
                "error": "Finish was called without either success or an error code being passed."
            }));
        } else if self.success.is_none() {
            debug!("Finish called without a declared outcome, treating as success");
            self.success = Some(true);
            self.progress = Some(100);
        }

        let mut response = Response::assemble(self.progress)
            .props(self.props.clone())
            .links(self.links.clone())
            .logs(self.logs.clone())
            .callback_sec(Some(self.callback_sec));
        if let Some(success) = self.success {
            response = response.success(success);
        }
        if let Some(error) = &self.error {
            response = response.error(error.clone());
        }
        if let Some(details) = &self.error_details {
            response = response.error_details(details.clone());
        }
        if let Some(data) = pass_back_data {
            response = response.pass_back_data(data);
        }
        response
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Operations still pending.
    pub fn ops(&self) -> &Ops {
        &self.ops
    }

    /// Attempt counters per error code.
    pub fn retries(&self) -> &Retries {
        &self.retries
    }

    /// Accumulated props.
    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Accumulated links.
    pub fn links(&self) -> &Map<String, Value> {
        &self.links
    }

    /// Log records of this invocation.
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    /// Returns true once a terminal outcome has been declared.
    pub fn is_returned(&self) -> bool {
        self.ret
    }

    /// Declared status code.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Declared progress.
    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Declared success flag.
    pub fn success(&self) -> Option<bool> {
        self.success
    }

    /// Declared error code.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Declared error details.
    pub fn error_details(&self) -> Option<&Value> {
        self.error_details.as_ref()
    }

    /// Whether the host should re-invoke, if declared.
    pub fn callback(&self) -> Option<bool> {
        self.callback
    }

    /// Requested delay before re-invocation.
    pub fn callback_sec(&self) -> u64 {
        self.callback_sec
    }
}

/// Exponential backoff in seconds for the given attempt count.
pub fn backoff_seconds(attempts: u32) -> u64 {
    2u64.saturating_pow(attempts)
}

fn merge_into<I, K>(target: &mut Map<String, Value>, entries: I)
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    for (key, value) in entries {
        target.insert(key.into(), value);
    }
}
