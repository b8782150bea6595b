//! Explicit viewer context passed into every projection and action

use serde::Serialize;

use crate::models::User;

/// Capability level of the viewing identity, derived once per view model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    #[default]
    Customer,
    Provider,
    Admin,
}

impl Role {
    /// Derive the role from a user record.
    ///
    /// Admin wins over provider; a provider whose request is not yet
    /// approved is still a customer.
    pub fn of(user: &User) -> Self {
        if user.is_admin {
            Role::Admin
        } else if user.is_approved_provider() {
            Role::Provider
        } else {
            Role::Customer
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }

    /// May approve or reject provider requests.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// May list services in the public catalog.
    pub fn can_offer_services(&self) -> bool {
        matches!(self, Role::Provider)
    }
}

/// Who is looking at the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id.clone(), Role::of(user))
    }
}
