//! Message-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direct message between two users. Never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    /// Both ids, used by the source's array-contains filter
    pub participants: Vec<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let sender_id = sender_id.into();
        let recipient_id = recipient_id.into();
        Self {
            id: String::new(),
            participants: vec![sender_id.clone(), recipient_id.clone()],
            sender_id,
            recipient_id,
            text: text.into(),
            timestamp,
        }
    }

    pub fn involves(&self, id: &str) -> bool {
        self.participants.iter().any(|p| p == id)
    }

    /// The other side of the conversation as seen by `viewer`.
    ///
    /// Returns `None` when the viewer is not a participant.
    pub fn counterparty(&self, viewer: &str) -> Option<&str> {
        if !self.involves(viewer) {
            return None;
        }
        if self.sender_id == viewer {
            Some(&self.recipient_id)
        } else {
            Some(&self.sender_id)
        }
    }

    /// True if the message was exchanged between exactly `a` and `b`.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }
}
