//! Shared test utilities for integration tests.
//!
//! Helpers for chaining invocations, proptest strategies for JSON maps, and a
//! tracing layer that records emitted events.

#![allow(dead_code)] // These utilities are used by other integration test files

use std::sync::{Arc, Mutex};

use extension_handler::{ExtensionHandler, PassBackData};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};

// =============================================================================
// Invocation helpers
// =============================================================================

/// Builds the next invocation's event from a serialized response.
pub fn next_event(response: &Value) -> Value {
    match response.get("pass_back_data") {
        Some(data) => json!({ "pass_back_data": data }),
        None => json!({}),
    }
}

/// Captures the carried state of a handler.
pub fn snapshot(handler: &ExtensionHandler) -> PassBackData {
    PassBackData {
        ops: handler.ops().clone(),
        retries: handler.retries().clone(),
        props: handler.props().clone(),
        links: handler.links().clone(),
    }
}

// =============================================================================
// Proptest strategies
// =============================================================================

/// Strategy for map keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

/// Strategy for scalar JSON values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9:/._-]{0,24}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

/// Strategy for a small JSON object.
pub fn map_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec((key_strategy(), scalar_strategy()), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for error codes.
pub fn error_code_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

// =============================================================================
// Tracing capture
// =============================================================================

/// Records the `message` of every event it sees.
#[derive(Clone, Default)]
pub struct MessageCapture {
    pub messages: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{:?}", value));
        }
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for MessageCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            self.messages.lock().unwrap().push(message);
        }
    }
}
