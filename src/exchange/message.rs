/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Messages carried by exchanges.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A message with named properties and an opaque content body.
///
/// # Examples
///
/// ```
/// use resequencer_rs::exchange::NormalizedMessage;
///
/// let message = NormalizedMessage::new()
///     .with_property("seqnum", 4)
///     .with_content("<number>4</number>");
/// assert_eq!(message.property("seqnum").and_then(|v| v.as_i64()), Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Message properties.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NormalizedMessage {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, builder style.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    /// Sets the content, builder style.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Returns the named property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a property, returning the previous value.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.insert(name.into(), value.into())
    }
}

/// A fault returned by a provider in place of a normal response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// Fault body.
    pub content: String,

    /// Fault properties.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Fault {
    /// Creates a fault with the given body.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            properties: BTreeMap::new(),
        }
    }
}
