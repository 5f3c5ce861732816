//! The envelope that flows through the in-memory queue fabric.

use std::collections::HashMap;

use uuid::Uuid;

/// An opaque, byte-oriented message. The fabric never interprets
/// `payload` -- callers serialize their own application messages into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: Uuid,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub headers: HashMap<String, String>,
    /// Set by the request/response template to correlate a response back
    /// to its request. Unused by plain producer/consumer traffic.
    pub correlation_id: Option<Uuid>,
}

impl QueueMessage {
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: None,
            payload: payload.into(),
            headers: HashMap::new(),
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
