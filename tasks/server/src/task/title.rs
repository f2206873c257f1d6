use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use std::fmt;

use crate::error::SafeError;
use crate::task::json_kind;

const TITLE_CONSTRAINT: &str = "Invalid title: must be non-empty string";

fn violation(kind: &str, raw: &str) -> SafeError {
    SafeError::new(format!("{TITLE_CONSTRAINT}, got {kind} {raw}"))
}

/// Task title, guaranteed non-empty on every boundary it crosses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title(String);

impl Title {
    /// Creates a title, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, SafeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(violation("string", "\"\""));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the title for output, refusing to emit an empty value.
    pub fn encode(&self) -> Result<&str, SafeError> {
        if self.0.is_empty() {
            return Err(violation("string", "\"\""));
        }
        Ok(&self.0)
    }

    /// Decodes a title read from the store, where NULL is possible.
    pub fn from_store(value: Option<String>) -> Result<Self, SafeError> {
        match value {
            Some(value) => Self::new(value),
            None => Err(violation("null", "NULL")),
        }
    }

    /// Encodes the title for writing to the store.
    pub fn to_store(&self) -> Result<String, SafeError> {
        self.encode().map(str::to_owned)
    }

    pub(crate) fn from_wire(value: serde_json::Value) -> Result<Self, SafeError> {
        match value {
            serde_json::Value::String(value) => Self::new(value),
            other => Err(violation(json_kind(&other), &other.to_string())),
        }
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.encode().map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_str(value)
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_wire(value).map_err(de::Error::custom)
    }
}
