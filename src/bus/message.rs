//! Messages carried by the broker.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::TransportError;

/// Content type stamped on JSON-encoded messages.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A message on a broker queue.
///
/// `correlation_id` and `reply_to` are message properties, not part of the
/// body, the same way an AMQP broker carries them.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: String,
    /// Serialized body
    pub payload: Vec<u8>,
    /// Token joining a request to its reply
    pub correlation_id: Option<String>,
    /// Queue the receiver should answer on
    pub reply_to: Option<String>,
    /// MIME type of the payload, if known
    pub content_type: Option<String>,
    /// Free-form headers
    pub headers: Vec<(String, String)>,
}

impl Message {
    /// Create a new message with the given payload.
    pub fn new(id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            payload,
            correlation_id: None,
            reply_to: None,
            content_type: None,
            headers: Vec::new(),
        }
    }

    /// Create a message with a JSON-serialized payload.
    pub fn encode_json<T: Serialize>(id: impl Into<String>, body: &T) -> Result<Self, TransportError> {
        let bytes = serde_json::to_vec(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        Ok(Self::new(id, bytes).with_content_type(JSON_CONTENT_TYPE))
    }

    /// Decode the payload from JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Create a message with a string payload.
    pub fn with_string_payload(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(id, payload.into().into_bytes())
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.reply_to = Some(queue.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a header to the message.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Look up a header by key.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// A message handed to a consumer that has not been settled yet.
///
/// Every delivery must be acked or nacked through the `Listener` it came
/// from, using `tag`.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Broker-assigned tag, unique per queue
    pub tag: u64,
    /// True when this message was delivered before and requeued
    pub redelivered: bool,
    pub message: Message,
}
