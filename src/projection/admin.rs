//! Admin dashboard queues

use serde::Serialize;

use super::index_users;
use crate::models::{RequestStatus, Service, ServiceStatus, User};

/// Approval queues shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminQueues {
    /// Users waiting for provider approval
    pub pending_users: Vec<User>,
    /// Users already flagged as providers
    pub providers: Vec<User>,
    /// Services waiting for approval whose owner isn't an approved provider
    pub pending_services: Vec<Service>,
    /// Approved services of approved providers
    pub available_services: Vec<Service>,
}

/// Build the admin queues from the current user and service sets.
///
/// A service is only available while its owner stays an approved
/// provider; it drops out on the next projection after the owner loses
/// that status.
pub fn project_admin_queues(users: &[User], services: &[Service]) -> AdminQueues {
    let owners = index_users(users);
    let owner_approved = |service: &Service| {
        owners
            .get(service.user_id.as_str())
            .is_some_and(|u| u.is_approved_provider())
    };

    let pending_users = users
        .iter()
        .filter(|u| !u.is_service_provider && u.request_status == RequestStatus::Pending)
        .cloned()
        .collect();
    let providers = users
        .iter()
        .filter(|u| u.is_service_provider)
        .cloned()
        .collect();
    let pending_services = services
        .iter()
        .filter(|s| s.status == ServiceStatus::Pending && !owner_approved(s))
        .cloned()
        .collect();
    let available_services = services
        .iter()
        .filter(|s| s.status == ServiceStatus::Approved && owner_approved(s))
        .cloned()
        .collect();

    AdminQueues {
        pending_users,
        providers,
        pending_services,
        available_services,
    }
}
