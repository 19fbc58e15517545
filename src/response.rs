//! Response payload returned to the host.
//!
//! Failures are modeled through `error`, never through the transport status:
//! `statusCode` is always 200. Every other key is omitted when unset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HandlerResult;
use crate::log::LogRecord;
use crate::state::PassBackData;

/// Transport status carried by every response.
pub const RESPONSE_STATUS_CODE: u16 = 200;

/// Re-invocation delay used when an assembled response names none.
pub const DEFAULT_CALLBACK_SEC: u64 = 2;

/// The payload an invocation hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always 200
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Progress percentage, 0 to 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Success flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured diagnostic payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,
    /// Continuation payload, present only on the retry path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_back_data: Option<PassBackData>,
    /// Free-form host state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    /// Accumulated props
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    /// Accumulated links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
    /// Log records of this invocation, in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogRecord>>,
    /// Delay hint before re-invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_sec: Option<u64>,
}

impl Response {
    /// Starts assembling a response at the given progress.
    ///
    /// Only `statusCode` and `callback_sec` (2) are set; everything else is
    /// added through the builder methods.
    ///
    /// ```
    /// use extension_handler::Response;
    /// use serde_json::json;
    ///
    /// let response = Response::assemble(Some(40)).error("throttled");
    /// assert_eq!(
    ///     response.to_value().unwrap(),
    ///     json!({"statusCode": 200, "progress": 40, "error": "throttled", "callback_sec": 2})
    /// );
    /// ```
    pub fn assemble(progress: Option<u8>) -> Self {
        Self {
            status_code: RESPONSE_STATUS_CODE,
            progress,
            success: None,
            error: None,
            error_details: None,
            pass_back_data: None,
            state: None,
            props: None,
            links: None,
            logs: None,
            callback_sec: Some(DEFAULT_CALLBACK_SEC),
        }
    }

    /// Sets the success flag.
    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Sets the error code.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the error details.
    pub fn error_details(mut self, details: Value) -> Self {
        self.error_details = Some(details);
        self
    }

    /// Sets the continuation payload.
    pub fn pass_back_data(mut self, data: PassBackData) -> Self {
        self.pass_back_data = Some(data);
        self
    }

    /// Sets the free-form host state.
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the props.
    pub fn props(mut self, props: Map<String, Value>) -> Self {
        self.props = Some(props);
        self
    }

    /// Sets the links.
    pub fn links(mut self, links: Map<String, Value>) -> Self {
        self.links = Some(links);
        self
    }

    /// Sets the log records.
    pub fn logs(mut self, logs: Vec<LogRecord>) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Sets or clears the callback delay.
    pub fn callback_sec(mut self, callback_sec: Option<u64>) -> Self {
        self.callback_sec = callback_sec;
        self
    }

    /// Returns true if the host should not expect to resume this job.
    ///
    /// A surfaced error is final even though it still carries
    /// `pass_back_data`; only an in-progress outcome schedules a callback.
    pub fn is_final(&self) -> bool {
        self.error.is_some() || self.pass_back_data.is_none()
    }

    /// Serializes the response into its JSON payload.
    pub fn to_value(&self) -> HandlerResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
