//! Inbox projection: one conversation per counterparty

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Message, User};
use crate::viewer::Viewer;

/// Display name used when a counterparty's profile can't be resolved.
const PLACEHOLDER_NAME: &str = "User";

/// Resolves a counterparty id to its profile record.
///
/// `Ok(None)` means the profile does not exist; `Err` means the lookup
/// itself failed. Both degrade to a placeholder in the projection.
pub trait ProfileLookup {
    fn lookup(&self, id: &str) -> Result<Option<User>>;
}

impl ProfileLookup for HashMap<String, User> {
    fn lookup(&self, id: &str) -> Result<Option<User>> {
        Ok(self.get(id).cloned())
    }
}

/// Profiles by id as delivered by per-id subscriptions; `None` marks a
/// missing record.
impl ProfileLookup for HashMap<String, Option<User>> {
    fn lookup(&self, id: &str) -> Result<Option<User>> {
        Ok(self.get(id).cloned().flatten())
    }
}

impl ProfileLookup for [User] {
    fn lookup(&self, id: &str) -> Result<Option<User>> {
        Ok(self.iter().find(|u| u.id == id).cloned())
    }
}

/// The parts of a profile shown next to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSnapshot {
    pub name: String,
    pub avatar: Option<String>,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl ProfileSnapshot {
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            avatar: None,
            is_online: false,
            last_seen: None,
        }
    }

    pub fn from_user(user: &User) -> Self {
        let name = if user.name.trim().is_empty() {
            PLACEHOLDER_NAME.to_string()
        } else {
            user.name.clone()
        };
        Self {
            name,
            avatar: user.profile_image.clone().filter(|s| !s.is_empty()),
            is_online: user.is_online,
            last_seen: user.last_seen,
        }
    }
}

/// Inbox entry for a single counterparty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub counterparty_id: String,
    pub profile: ProfileSnapshot,
    pub last_text: String,
    pub last_timestamp: DateTime<Utc>,
}

/// Fold a message set into one conversation per counterparty.
///
/// Keeps the newest message per counterparty whatever the input order
/// (first seen wins on equal timestamps). Messages that do not involve
/// the viewer are skipped. Output is newest first, ties by counterparty id.
pub fn project_conversations<L>(
    messages: &[Message],
    profiles: &L,
    viewer: &Viewer,
) -> Vec<Conversation>
where
    L: ProfileLookup + ?Sized,
{
    let mut latest: HashMap<&str, &Message> = HashMap::new();
    for msg in messages {
        let Some(other) = msg.counterparty(&viewer.id) else {
            tracing::debug!("Skipping message {} not addressed to viewer", msg.id);
            continue;
        };
        match latest.entry(other) {
            Entry::Vacant(e) => {
                e.insert(msg);
            }
            Entry::Occupied(mut e) => {
                if msg.timestamp > e.get().timestamp {
                    e.insert(msg);
                }
            }
        }
    }

    // `latest` has one entry per counterparty, so each profile is looked up once.
    let mut conversations: Vec<Conversation> = latest
        .into_iter()
        .map(|(other, msg)| Conversation {
            counterparty_id: other.to_string(),
            profile: resolve_profile(profiles, other),
            last_text: msg.text.clone(),
            last_timestamp: msg.timestamp,
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_timestamp
            .cmp(&a.last_timestamp)
            .then_with(|| a.counterparty_id.cmp(&b.counterparty_id))
    });
    conversations
}

fn resolve_profile<L: ProfileLookup + ?Sized>(profiles: &L, id: &str) -> ProfileSnapshot {
    match profiles.lookup(id) {
        Ok(Some(user)) => ProfileSnapshot::from_user(&user),
        Ok(None) => {
            tracing::debug!("No profile for counterparty {}, using placeholder", id);
            ProfileSnapshot::placeholder()
        }
        Err(e) => {
            tracing::warn!("Profile lookup for {} failed: {}", id, e);
            ProfileSnapshot::placeholder()
        }
    }
}
