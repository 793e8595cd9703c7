use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while building shared primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("instruction text cannot be empty")]
    EmptyInstruction,
    #[error("location cannot be empty")]
    EmptyLocation,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural-language description of one intended interaction with the remote UI.
///
/// The text is used verbatim as a cache key component, so it is never
/// normalised after construction.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction(String);

impl Instruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn try_new(text: impl Into<String>) -> Result<Self, TypeError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TypeError::EmptyInstruction);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instruction {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Instruction {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Current address of the remote UI (usually a URL).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Location(String);

impl Location {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TypeError::EmptyLocation);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring test used for page markers such as `home.htm`.
    pub fn contains(&self, marker: &str) -> bool {
        !marker.is_empty() && self.0.contains(marker)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Cache scope for a resolved action: the same instruction text means
/// different things on different screens.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Fingerprint {
    pub location: Location,
    pub instruction: Instruction,
}

impl Fingerprint {
    pub fn new(location: Location, instruction: Instruction) -> Self {
        Self {
            location,
            instruction,
        }
    }

    /// Stable, file-safe key: hex SHA-256 of `location \n instruction`.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.location.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.instruction.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.instruction, self.location)
    }
}

/// Opaque, replayable handle to a located UI target.
///
/// Only the actuator that produced it knows what it means; the helpers below
/// read conventional fields for logging and never interpret them.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor(Value);

impl Descriptor {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn selector(&self) -> Option<&str> {
        self.0.get("selector").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.selector(), self.description()) {
            (Some(selector), Some(description)) => write!(f, "{selector} ({description})"),
            (Some(selector), None) => f.write_str(selector),
            _ => write!(f, "{}", self.0),
        }
    }
}
