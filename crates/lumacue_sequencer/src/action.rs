// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named action payloads dispatched through the callback registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order-preserving parameter bundle handed to a handler unmodified
///
/// The action taxonomy is open-ended and defined by the embedder, so the
/// bundle is deliberately untyped.
pub type Params = IndexMap<String, Value>;

/// A named unit of work fired by a trigger element
///
/// Constructed once at load time and immutable thereafter; owned by the
/// trigger element that fires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Name matched against the callback registry
    pub name: String,
    /// Parameters passed through to the handler
    #[serde(default)]
    pub parameters: Params,
    /// Seconds after the owning trigger fires; absent or zero fires
    /// immediately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
}

impl Action {
    /// Create an action that fires as soon as its owner triggers
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Params::new(),
            offset: None,
        }
    }

    /// Replace the parameter bundle
    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set a single parameter
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Delay the action by `offset` seconds relative to the owner's firing
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether this action waits out an offset after its owner fires
    pub fn is_offset(&self) -> bool {
        self.offset.is_some_and(|offset| offset > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_builder() {
        let action = Action::new("light1")
            .with_parameter("output", "on")
            .with_parameter("channel", 3);

        assert_eq!(action.name, "light1");
        assert_eq!(action.parameters["output"], json!("on"));
        assert_eq!(action.parameters["channel"], json!(3));
        assert!(!action.is_offset());
    }

    #[test]
    fn test_offset_detection() {
        assert!(Action::new("a").with_offset(0.5).is_offset());
        assert!(!Action::new("a").with_offset(0.0).is_offset());
        assert!(!Action::new("a").is_offset());
    }

    #[test]
    fn test_parameter_order_preserved() {
        let action = Action::new("cue")
            .with_parameter("z", 1)
            .with_parameter("a", 2)
            .with_parameter("m", 3);

        let keys: Vec<&str> = action.parameters.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }
}
