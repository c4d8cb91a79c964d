//! Inbound message envelope.

use serde::{Deserialize, Serialize};

/// A message delivered to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Transport-assigned identifier
    pub id: String,
    /// Routing key (e.g., "ship-order", "cancel-order")
    pub type_key: String,
    /// Serialized payload (typically JSON or binary)
    pub payload: Vec<u8>,
    /// Optional metadata (headers, correlation IDs, etc.)
    pub metadata: Option<Vec<(String, String)>>,
}

impl Envelope {
    /// Create a new envelope with the given type key and payload.
    pub fn new(id: impl Into<String>, type_key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            type_key: type_key.into(),
            payload,
            metadata: None,
        }
    }

    /// Create an envelope with a string payload.
    pub fn with_string_payload(
        id: impl Into<String>,
        type_key: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(id, type_key, payload.into().into_bytes())
    }

    /// Create an envelope with a JSON payload.
    pub fn json<T: Serialize>(
        id: impl Into<String>,
        type_key: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(id, type_key, serde_json::to_vec(payload)?))
    }

    /// Create an envelope with a bitcode-serialized payload.
    pub fn encode<T: Serialize>(
        id: impl Into<String>,
        type_key: impl Into<String>,
        payload: &T,
    ) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(payload)?;
        Ok(Self::new(id, type_key, bytes))
    }

    /// Decode the payload from bitcode binary format.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    /// Add metadata to the envelope.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Look up a metadata value; the last entry wins for repeated keys.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .iter()
            .rfind(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
