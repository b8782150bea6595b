//! User-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of a user's request to become a service provider
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    None,
    Pending,
    Approved,
}

/// User profile record
///
/// Flags absent from the stored document read as `false` / `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub is_service_provider: bool,
    #[serde(default)]
    pub request_status: RequestStatus,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Set once the owner has signed in with a verified email.
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Provider whose request has been approved by an admin.
    ///
    /// Only these users' services are listed to customers.
    pub fn is_approved_provider(&self) -> bool {
        self.is_service_provider && self.request_status == RequestStatus::Approved
    }
}
