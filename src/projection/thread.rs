//! Two-party message thread for the chat screen

use crate::models::{Message, User};
use crate::viewer::Viewer;

/// Messages exchanged between the viewer and `counterparty`, oldest first.
pub fn project_thread(messages: &[Message], viewer: &Viewer, counterparty: &str) -> Vec<Message> {
    let mut thread: Vec<Message> = messages
        .iter()
        .filter(|m| m.is_between(&viewer.id, counterparty))
        .cloned()
        .collect();
    // Stable: equal timestamps keep stream order.
    thread.sort_by_key(|m| m.timestamp);
    thread
}

/// Header line under the counterparty's name.
pub fn presence_line(user: Option<&User>) -> Option<String> {
    let user = user?;
    if user.is_online {
        return Some("Online".to_string());
    }
    user.last_seen
        .map(|ts| format!("Last seen: {}", ts.format("%Y-%m-%d %H:%M")))
}
