//! Read-only configuration for an application instance.
//!
//! A [`Config`] is an immutable key/value map assembled once per node, before
//! any request is dispatched. The engine itself consumes a handful of
//! well-known keys; everything else is preserved untouched for the
//! application's init delegate (database settings, feature flags, and so on).

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::Error;

/// Well-known key: `development` or `production`.
pub const ENVIRONMENT_KEY: &str = "environment";
/// Well-known key: shared secret used to verify externally originated requests.
pub const CLIENT_SECRET_KEY: &str = "client_secret";
/// Well-known key: path prefix trimmed from externally originated requests.
pub const BASE_PATH_KEY: &str = "base_path";
/// Well-known key: override for the recursion ceiling (default 10).
pub const MAX_NESTING_KEY: &str = "max_nesting_level";

/// Immutable configuration map.
///
/// Values are set at assembly time via [`Config::with`] or loaded from JSON;
/// there is no mutation API after that.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from a JSON object value.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(Error::configuration(format!(
                "configuration must be a JSON object, got {other}"
            ))),
        }
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("unable to read config {}: {e}", path.display()))
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            Error::configuration(format!("unable to parse config {}: {e}", path.display()))
        })?;
        Self::from_value(value)
    }

    /// Assembly-time builder; replaces any existing value for `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.get_str(ENVIRONMENT_KEY)
    }

    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.get_str(CLIENT_SECRET_KEY)
    }

    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.get_str(BASE_PATH_KEY)
    }

    #[must_use]
    pub fn max_nesting_level(&self) -> Option<u32> {
        self.get(MAX_NESTING_KEY)
            .and_then(Value::as_u64)
            .map(|v| v as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_and_accessors() {
        let config = Config::new()
            .with(ENVIRONMENT_KEY, "development")
            .with(CLIENT_SECRET_KEY, "s3cr3t")
            .with(MAX_NESTING_KEY, 4)
            .with("db_dsn", "sqlite::memory:");

        assert_eq!(config.environment(), Some("development"));
        assert_eq!(config.client_secret(), Some("s3cr3t"));
        assert_eq!(config.max_nesting_level(), Some(4));
        assert_eq!(config.get_str("db_dsn"), Some("sqlite::memory:"));
        assert!(config.base_path().is_none());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Config::from_value(json!(["not", "an", "object"])).is_err());
        assert!(Config::from_value(json!({"environment": "production"})).is_ok());
    }
}
