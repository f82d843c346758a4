//! Opaque session record

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authentication state produced by a login flow
///
/// Stored as raw JSON so that the registry never needs to know its shape.
/// Flows that own a concrete session type convert with [`Session::from_typed`]
/// and [`Session::to_typed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Value);

impl Session {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Builds a session from any serializable record
    pub fn from_typed<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(record).map(Self)
    }

    /// Reads the session back as a concrete record
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// Session identifier the API expects in the query string, when the
    /// record has a string `sessionId` field
    pub fn id(&self) -> Option<&str> {
        self.0.get("sessionId").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Session {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
