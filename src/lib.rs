//! # Extension Handler
//!
//! A resumable step-execution handler for work that cannot finish inside a
//! single time-bounded invocation, such as a Lambda function deploying cloud
//! resources.
//!
//! ## Overview
//!
//! Each invocation builds an [`ExtensionHandler`], restores the continuation
//! payload the previous invocation returned, runs whichever steps are still
//! pending, and calls [`finish`](ExtensionHandler::finish). The resulting
//! [`Response`] tells the host whether the job succeeded, failed for good, or
//! should be re-invoked after a backoff delay with a new continuation payload.
//!
//! ### Key Features
//!
//! - **Operation tracking**: named pending operations carried across
//!   invocations; finished steps are skipped on resumption.
//! - **Per-error retries**: each error code has its own attempt counter and an
//!   exponential backoff of `2^attempts` seconds until the configured cap.
//! - **Accumulated metadata**: props and links merge across invocations.
//! - **Conditional steps**: sync, fallible and async steps gated on the
//!   handler's state via [`Ext`] or [`ExtensionHandler::run_step`].
//!
//! ## Example
//!
//! ```rust
//! use extension_handler::{ExtensionHandler, HandlerConfig};
//! use serde_json::json;
//!
//! fn invoke(event: &serde_json::Value) -> serde_json::Value {
//!     let mut handler = ExtensionHandler::new(HandlerConfig::default());
//!     handler.declare_pass_back_data_from_event(event).unwrap();
//!
//!     // First invocation: register the work.
//!     if handler.ops().is_empty() && handler.props().is_empty() {
//!         handler.add_op("create_bucket");
//!     }
//!
//!     handler.run_step(Some("create_bucket"), true, |h| {
//!         h.add_props([("bucket_name", json!("artifacts-123"))]);
//!         h.add_log("Bucket created", json!({}), false);
//!     });
//!
//!     handler.finish().to_value().unwrap()
//! }
//!
//! let response = invoke(&json!({}));
//! assert_eq!(response["success"], json!(true));
//! assert_eq!(response["props"]["bucket_name"], json!("artifacts-123"));
//! ```
//!
//! ## Retrying
//!
//! ```rust
//! use extension_handler::{ExtensionHandler, HandlerConfig};
//!
//! let mut handler = ExtensionHandler::new(HandlerConfig::default());
//! handler.retry_error("throttled", 40, 0);
//! let response = handler.finish();
//!
//! // The error is downgraded to an in-progress outcome with a 2 second delay.
//! assert!(response.error.is_none());
//! assert_eq!(response.callback_sec, Some(2));
//! assert_eq!(response.pass_back_data.unwrap().retries["throttled"], 1);
//! ```
//!
//! ## Concurrency
//!
//! One handler serves one invocation and is not shared. Invocations of the
//! same job must be serialized by the host; two invocations resuming the same
//! continuation payload are not detected.

pub mod account;
pub mod config;
pub mod declaration;
pub mod error;
pub mod handler;
pub mod log;
pub mod naming;
pub mod response;
pub mod state;
pub mod step;

pub use account::{account_context, AccountContext, InvocationContext};
pub use config::HandlerConfig;
pub use declaration::Declaration;
pub use error::{HandlerError, HandlerResult};
pub use handler::{ExtensionHandler, NO_SUCCESS_OR_ERROR};
pub use log::LogRecord;
pub use naming::safe_component_name;
pub use response::Response;
pub use state::PassBackData;
pub use step::{ext, Ext, ExtBuilder, StepFuture};
