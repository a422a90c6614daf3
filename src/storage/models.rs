use serde::{Deserialize, Serialize};

use crate::common::{Message, StoreError};

/// Persisted form of a message. The id is the storage key and is kept
/// outside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub text: String,
    pub timestamp: i64,
    pub location: String,
}

impl MessageRecord {
    /// Encodes the record as JSON text for flat key-value backends.
    pub fn encode(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn into_message(self, id: String) -> Message {
        Message {
            id,
            text: self.text,
            timestamp: self.timestamp,
            location: self.location,
        }
    }

    /// True when `timestamp` lies strictly between the optional bounds.
    pub fn within(&self, after: Option<i64>, before: Option<i64>) -> bool {
        after.is_none_or(|after| self.timestamp > after)
            && before.is_none_or(|before| self.timestamp < before)
    }
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text.clone(),
            timestamp: message.timestamp,
            location: message.location.clone(),
        }
    }
}
