//! Conditional step execution.
//!
//! A step runs only while the invocation has no terminal outcome and, when it
//! is bound to an operation, only while that operation is still pending. This
//! is what lets a resumed invocation skip the steps an earlier invocation
//! already finished.
//!
//! A step that returns normally without declaring an outcome completes its
//! operation (unless told not to). A step that declares an outcome, or a
//! fallible step that returns `Err`, leaves its operation pending.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::error::{HandlerError, HandlerResult};
use crate::handler::ExtensionHandler;

/// Boxed future returned by an async step.
pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

impl ExtensionHandler {
    /// Returns true if a step bound to `op` would run now.
    pub fn should_run(&self, op: Option<&str>) -> bool {
        if self.ret {
            debug!(?op, "Terminal outcome already declared, skipping step");
            return false;
        }
        match op {
            Some(name) if !self.ops.contains_key(name) => {
                debug!(op = %name, "Op not pending, skipping step");
                false
            }
            _ => true,
        }
    }

    /// Runs `step` if it is still pending, completing `op` afterwards.
    ///
    /// Returns `None` when the step was skipped.
    pub fn run_step<T, F>(&mut self, op: Option<&str>, complete_op: bool, step: F) -> Option<T>
    where
        F: FnOnce(&mut ExtensionHandler) -> T,
    {
        if !self.should_run(op) {
            return None;
        }
        let output = step(self);
        self.settle_step(op, complete_op);
        Some(output)
    }

    /// Like [`run_step`](Self::run_step) for steps that can fail.
    ///
    /// An `Err` from the step is returned as-is and the operation stays
    /// pending.
    pub fn try_run_step<T, E, F>(
        &mut self,
        op: Option<&str>,
        complete_op: bool,
        step: F,
    ) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut ExtensionHandler) -> Result<T, E>,
    {
        if !self.should_run(op) {
            return Ok(None);
        }
        let output = step(self)?;
        self.settle_step(op, complete_op);
        Ok(Some(output))
    }

    /// Like [`run_step`](Self::run_step) for steps that await.
    ///
    /// ```
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// use extension_handler::ExtensionHandler;
    ///
    /// let mut handler = ExtensionHandler::default();
    /// handler.add_op("fetch");
    /// let fetched = handler
    ///     .run_step_async(Some("fetch"), true, |h| {
    ///         Box::pin(async move {
    ///             h.add_log("Fetched", serde_json::json!({}), false);
    ///             7
    ///         })
    ///     })
    ///     .await;
    /// assert_eq!(fetched, Some(7));
    /// # });
    /// ```
    pub async fn run_step_async<T, F>(
        &mut self,
        op: Option<&str>,
        complete_op: bool,
        step: F,
    ) -> Option<T>
    where
        F: for<'a> FnOnce(&'a mut ExtensionHandler) -> StepFuture<'a, T>,
    {
        if !self.should_run(op) {
            return None;
        }
        let output = step(self).await;
        self.settle_step(op, complete_op);
        Some(output)
    }

    fn settle_step(&mut self, op: Option<&str>, complete_op: bool) {
        if !complete_op || self.ret {
            return;
        }
        if let Some(name) = op {
            self.complete_op(name);
        }
    }
}

/// A step wrapper bound to a handler and an optional operation.
///
/// # Example
///
/// ```
/// use extension_handler::{Ext, ExtensionHandler};
///
/// let mut handler = ExtensionHandler::default();
/// handler.add_op("create_table");
///
/// let mut step = Ext::builder().handler(&mut handler).op("create_table").build().unwrap();
/// assert_eq!(step.run(|_| "created"), Some("created"));
/// // The op is done now, so a second run is skipped.
/// assert_eq!(step.run(|_| "created"), None);
/// ```
#[derive(Debug)]
pub struct Ext<'h> {
    handler: &'h mut ExtensionHandler,
    op: Option<String>,
    complete_op: bool,
}

impl<'h> Ext<'h> {
    /// Starts configuring a step wrapper.
    pub fn builder() -> ExtBuilder<'h> {
        ExtBuilder::default()
    }

    /// The operation this step is bound to.
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// The handler this step gates on.
    pub fn handler(&mut self) -> &mut ExtensionHandler {
        &mut *self.handler
    }

    /// Runs the step if it is still pending.
    pub fn run<T, F>(&mut self, step: F) -> Option<T>
    where
        F: FnOnce(&mut ExtensionHandler) -> T,
    {
        self.handler
            .run_step(self.op.as_deref(), self.complete_op, step)
    }

    /// Runs a fallible step if it is still pending.
    pub fn try_run<T, E, F>(&mut self, step: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut ExtensionHandler) -> Result<T, E>,
    {
        self.handler
            .try_run_step(self.op.as_deref(), self.complete_op, step)
    }

    /// Runs an async step if it is still pending.
    pub async fn run_async<T, F>(&mut self, step: F) -> Option<T>
    where
        F: for<'a> FnOnce(&'a mut ExtensionHandler) -> StepFuture<'a, T>,
    {
        self.handler
            .run_step_async(self.op.as_deref(), self.complete_op, step)
            .await
    }
}

/// Builder for [`Ext`].
#[derive(Debug)]
pub struct ExtBuilder<'h> {
    handler: Option<&'h mut ExtensionHandler>,
    op: Option<String>,
    complete_op: bool,
}

impl Default for ExtBuilder<'_> {
    fn default() -> Self {
        Self {
            handler: None,
            op: None,
            complete_op: true,
        }
    }
}

impl<'h> ExtBuilder<'h> {
    /// Sets the handler to gate on.
    pub fn handler(mut self, handler: &'h mut ExtensionHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Binds the step to an operation.
    pub fn op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Sets whether a clean run completes the operation. Defaults to true.
    pub fn complete_op(mut self, complete_op: bool) -> Self {
        self.complete_op = complete_op;
        self
    }

    /// Builds the wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::MissingHandler`] if no handler was given.
    pub fn build(self) -> HandlerResult<Ext<'h>> {
        let handler = self.handler.ok_or(HandlerError::MissingHandler)?;
        Ok(Ext {
            handler,
            op: self.op,
            complete_op: self.complete_op,
        })
    }
}

/// Binds a step wrapper to an optional handler and operation.
///
/// Equivalent to the builder with `complete_op` left at true.
pub fn ext<'h>(
    handler: Option<&'h mut ExtensionHandler>,
    op: Option<&str>,
) -> HandlerResult<Ext<'h>> {
    let mut builder = ExtBuilder::default();
    builder.handler = handler;
    builder.op = op.map(str::to_string);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Declaration;
    use serde_json::json;

    #[test]
    fn test_step_without_op_runs() {
        let mut handler = ExtensionHandler::default();
        assert_eq!(handler.run_step(None, true, |_| 1), Some(1));
    }

    #[test]
    fn test_step_skipped_when_op_not_pending() {
        let mut handler = ExtensionHandler::default();
        let mut ran = false;
        let result = handler.run_step(Some("x"), true, |_| ran = true);
        assert!(result.is_none());
        assert!(!ran);
    }

    #[test]
    fn test_step_runs_and_completes_pending_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        assert_eq!(handler.run_step(Some("x"), true, |_| "done"), Some("done"));
        assert!(!handler.ops().contains_key("x"));
    }

    #[test]
    fn test_step_keeps_op_when_complete_disabled() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        handler.run_step(Some("x"), false, |_| ());
        assert!(handler.ops().contains_key("x"));
    }

    #[test]
    fn test_step_declaring_error_is_not_completed() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        handler.run_step(Some("x"), true, |h| h.retry_error("timeout", 10, 0));
        assert!(handler.ops().contains_key("x"));
        assert!(handler.is_returned());
    }

    #[test]
    fn test_step_declaring_success_is_not_completed() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        handler.run_step(Some("x"), true, |h| h.declare_return(Declaration::success()));
        assert!(handler.ops().contains_key("x"));
    }

    #[test]
    fn test_steps_skipped_after_declaration() {
        let mut handler = ExtensionHandler::default();
        handler.perm_error("fatal", 0);
        let mut ran = false;
        assert!(handler.run_step(None, true, |_| ran = true).is_none());
        assert!(!ran);
    }

    #[test]
    fn test_step_can_add_later_ops() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("plan");
        handler.run_step(Some("plan"), true, |h| h.add_op("apply"));
        assert!(handler.should_run(Some("apply")));
        assert!(!handler.should_run(Some("plan")));
    }

    #[test]
    fn test_try_run_propagates_err_and_keeps_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        let result: Result<Option<()>, String> =
            handler.try_run_step(Some("x"), true, |_| Err("io failure".to_string()));
        assert_eq!(result, Err("io failure".to_string()));
        assert!(handler.ops().contains_key("x"));
    }

    #[test]
    fn test_try_run_ok_completes_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        let result: Result<Option<u8>, String> = handler.try_run_step(Some("x"), true, |_| Ok(4));
        assert_eq!(result, Ok(Some(4)));
        assert!(handler.ops().is_empty());
    }

    #[test]
    fn test_builder_without_handler_is_misuse() {
        let err = Ext::builder().op("x").build().unwrap_err();
        assert!(err.is_misuse());
    }

    #[test]
    fn test_ext_fn_without_handler_is_misuse() {
        let err = ext(None, Some("x")).unwrap_err();
        assert!(matches!(err, HandlerError::MissingHandler));
    }

    #[test]
    fn test_ext_binds_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        let mut step = ext(Some(&mut handler), Some("x")).unwrap();
        assert_eq!(step.op(), Some("x"));
        step.run(|h| h.add_props([("ran", json!(true))]).len());
        assert!(handler.ops().is_empty());
        assert_eq!(handler.props().get("ran"), Some(&json!(true)));
    }

    #[test]
    fn test_builder_complete_op_false() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("x");
        let mut step = Ext::builder()
            .handler(&mut handler)
            .op("x")
            .complete_op(false)
            .build()
            .unwrap();
        assert_eq!(step.run(|_| 1), Some(1));
        assert_eq!(step.run(|_| 2), Some(2));
        assert!(step.handler().ops().contains_key("x"));
    }

    #[tokio::test]
    async fn test_async_step_completes_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("fetch");
        let result = handler
            .run_step_async(Some("fetch"), true, |h| {
                Box::pin(async move {
                    h.add_links([("doc", json!("https://example.com"))]);
                    "ok"
                })
            })
            .await;
        assert_eq!(result, Some("ok"));
        assert!(handler.ops().is_empty());
        assert_eq!(handler.links().len(), 1);
    }

    #[tokio::test]
    async fn test_async_step_declaring_error_keeps_op() {
        let mut handler = ExtensionHandler::default();
        handler.add_op("fetch");
        let mut step = Ext::builder().handler(&mut handler).op("fetch").build().unwrap();
        step.run_async(|h| {
            Box::pin(async move {
                h.retry_error("upstream_unavailable", 0, 0);
            })
        })
        .await;
        assert!(handler.ops().contains_key("fetch"));
    }

    #[tokio::test]
    async fn test_async_step_skipped_when_not_pending() {
        let mut handler = ExtensionHandler::default();
        let result = handler
            .run_step_async(Some("fetch"), true, |_| Box::pin(async { 1 }))
            .await;
        assert!(result.is_none());
    }
}
