//! Messaging actions

use chrono::Utc;

use super::{client::HiveClient, required};
use crate::error::{HiveError, Result};
use crate::live::{InboxFeed, ThreadFeed, ThreadView};
use crate::models::Message;
use crate::projection::Conversation;
use crate::source::{Collection, RecordSource};

impl<S: RecordSource> HiveClient<S> {
    /// Send `text` to `recipient` and return the stored message.
    pub async fn send_message(&self, recipient: &str, text: &str) -> Result<Message> {
        let recipient = required(recipient, "Recipient")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(HiveError::Validation("Message can't be empty.".to_string()));
        }
        if recipient == self.viewer().id {
            return Err(HiveError::Validation(
                "You can't send a message to yourself.".to_string(),
            ));
        }

        let mut message = Message::new(&self.viewer().id, recipient, text, Utc::now());
        message.id = self
            .write_model(Collection::Messages, None, &message)
            .await?;
        tracing::debug!("Sent message {} to {}", message.id, recipient);
        Ok(message)
    }

    /// Current inbox, one entry per counterparty.
    pub async fn inbox(&self) -> Result<Vec<Conversation>> {
        self.inbox_feed()?.next().await
    }

    /// Current thread with `counterparty`.
    pub async fn thread(&self, counterparty: &str) -> Result<ThreadView> {
        self.thread_feed(counterparty)?.next().await
    }

    pub fn inbox_feed(&self) -> Result<InboxFeed<'_, S>> {
        InboxFeed::open(self.source(), self.viewer().clone())
    }

    pub fn thread_feed(&self, counterparty: &str) -> Result<ThreadFeed> {
        let counterparty = required(counterparty, "Counterparty")?;
        ThreadFeed::open(self.source(), self.viewer().clone(), counterparty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::source::MemoryStore;
    use crate::viewer::Viewer;

    #[tokio::test]
    async fn test_send_then_reply_updates_inbox() {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Users,
                "u2",
                &User {
                    name: "Bea".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let ann = HiveClient::new(store.clone(), Viewer::customer("u1"));
        let bea = HiveClient::new(store.clone(), Viewer::customer("u2"));

        let sent = ann.send_message("u2", "  hi ").await.unwrap();
        assert_eq!(sent.text, "hi");
        assert_eq!(sent.participants, vec!["u1".to_string(), "u2".to_string()]);
        assert!(!sent.id.is_empty());

        // Make sure the reply is strictly newer.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        bea.send_message("u1", "yo").await.unwrap();

        let inbox = ann.inbox().await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].counterparty_id, "u2");
        assert_eq!(inbox[0].profile.name, "Bea");
        assert_eq!(inbox[0].last_text, "yo");

        let thread = ann.thread("u2").await.unwrap();
        let texts: Vec<&str> = thread.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "yo"]);
    }

    #[tokio::test]
    async fn test_send_refuses_blank_and_self() {
        let store = MemoryStore::new();
        let client = HiveClient::new(store.clone(), Viewer::customer("u1"));

        assert!(matches!(
            client.send_message("u2", "   ").await,
            Err(HiveError::Validation(_))
        ));
        assert!(matches!(
            client.send_message("u1", "hello me").await,
            Err(HiveError::Validation(_))
        ));
        assert_eq!(store.len(Collection::Messages), 0);
    }

    #[tokio::test]
    async fn test_send_offline_is_retryable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let client = HiveClient::new(store.clone(), Viewer::customer("u1"));
        let err = client.send_message("u2", "hi").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.len(Collection::Messages), 0);
    }
}
