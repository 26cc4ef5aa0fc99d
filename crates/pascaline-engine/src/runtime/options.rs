//! Engine configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Malformed JSON or unknown field
    #[error("Failed to parse engine options: {0}")]
    Parse(#[from] serde_json::Error),

    /// Value outside the accepted range
    #[error("Invalid engine options: {0}")]
    Invalid(String),
}

/// Interpreter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    /// Maximum number of nested method/property/function invocations
    #[serde(default = "default_max_recursion_depth")]
    pub max_recursion_depth: usize,

    /// Declare the root `TObject` class at start-up
    #[serde(default = "default_true")]
    pub implicit_tobject: bool,

    /// Declare the intrinsic helpers for arrays, strings, enums and numbers
    #[serde(default = "default_true")]
    pub intrinsic_helpers: bool,
}

fn default_max_recursion_depth() -> usize {
    256
}

fn default_true() -> bool {
    true
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: default_max_recursion_depth(),
            implicit_tobject: true,
            intrinsic_helpers: true,
        }
    }
}

impl EngineOptions {
    /// Load options from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: EngineOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_recursion_depth == 0 {
            return Err(OptionsError::Invalid(
                "max_recursion_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Same options with a different recursion limit
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.max_recursion_depth, 256);
        assert!(options.implicit_tobject);
        assert!(options.intrinsic_helpers);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let options = EngineOptions::from_json(r#"{ "max_recursion_depth": 64 }"#).unwrap();
        assert_eq!(options.max_recursion_depth, 64);
        assert!(options.implicit_tobject);
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let err = EngineOptions::from_json(r#"{ "max_depth": 64 }"#).unwrap_err();
        assert!(matches!(err, OptionsError::Parse(_)));
    }

    #[test]
    fn test_from_json_rejects_zero_depth() {
        let err = EngineOptions::from_json(r#"{ "max_recursion_depth": 0 }"#).unwrap_err();
        assert!(matches!(err, OptionsError::Invalid(_)));
    }

    #[test]
    fn test_serialize_roundtrip_shape() {
        let json = serde_json::to_string(&EngineOptions::default()).unwrap();
        assert!(json.contains("\"intrinsic_helpers\":true"));
    }
}
