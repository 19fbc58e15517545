//! Continuation payload carried between invocations.
//!
//! The host treats this payload as opaque: `finish` produces it on the retry
//! path and the next invocation hands it back to
//! [`declare_pass_back_data`](crate::handler::ExtensionHandler::declare_pass_back_data).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Map of pending operation names to their values.
pub type Ops = Map<String, Value>;

/// Map of error codes to the number of invocations that ended in them.
pub type Retries = BTreeMap<String, u32>;

/// Opaque state handed back to the host and re-supplied on the next invocation.
///
/// Every key is optional on the way in; a missing or `null` key is read as
/// empty.
///
/// ```
/// use extension_handler::PassBackData;
///
/// let data: PassBackData =
///     serde_json::from_str(r#"{"ops": null, "retries": {"timeout": 2}}"#).unwrap();
/// assert!(data.ops.is_empty());
/// assert_eq!(data.retries.get("timeout"), Some(&2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassBackData {
    /// Operations still pending
    #[serde(default, deserialize_with = "null_as_default")]
    pub ops: Ops,
    /// Attempt counters per error code
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: Retries,
    /// Accumulated caller-visible metadata
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Map<String, Value>,
    /// Accumulated references
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Map<String, Value>,
}

impl PassBackData {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a payload from an optional JSON value.
    ///
    /// `None` and `null` both yield an empty payload.
    pub fn from_value(value: Option<&Value>) -> Result<Self, serde_json::Error> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(v) => Self::deserialize(v),
        }
    }

    /// Returns true if all four maps are empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
            && self.retries.is_empty()
            && self.props.is_empty()
            && self.links.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_missing_value() {
        let data = PassBackData::from_value(None).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_from_null_value() {
        let data = PassBackData::from_value(Some(&Value::Null)).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_null_keys_are_empty() {
        let value = json!({"ops": null, "retries": null, "props": null, "links": null});
        let data = PassBackData::from_value(Some(&value)).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_partial_payload() {
        let value = json!({"ops": {"create_bucket": true}, "props": {"arn": "x"}});
        let data = PassBackData::from_value(Some(&value)).unwrap();
        assert_eq!(data.ops.get("create_bucket"), Some(&json!(true)));
        assert_eq!(data.props.get("arn"), Some(&json!("x")));
        assert!(data.retries.is_empty());
        assert!(data.links.is_empty());
    }

    #[test]
    fn test_rejects_malformed_retries() {
        let value = json!({"retries": {"timeout": "many"}});
        assert!(PassBackData::from_value(Some(&value)).is_err());
    }

    #[test]
    fn test_serializes_all_keys() {
        let mut data = PassBackData::new();
        data.retries.insert("E".to_string(), 1);
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(
            value,
            json!({"ops": {}, "retries": {"E": 1}, "props": {}, "links": {}})
        );
    }
}
