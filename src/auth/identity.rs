//! Signed-in identity and its storage

use serde::{Deserialize, Serialize};

/// Identity returned by the hosted auth service at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            email_verified,
        }
    }
}

/// Identity store trait for different storage backends
pub trait IdentityStore {
    fn get_identity(&self) -> Option<Identity>;
    fn set_identity(&mut self, identity: Identity);
    fn clear_identity(&mut self);
}
