//! Customer-facing service catalog

use super::index_users;
use crate::models::{Service, User};

/// Services a customer may browse and book.
///
/// A service is listed while its owner is an approved provider, whatever
/// the service's own status.
/// `query` matches the category case-insensitively; blank means everything.
/// Sorted by service name.
pub fn project_catalog(services: &[Service], users: &[User], query: &str) -> Vec<Service> {
    let owners = index_users(users);
    let needle = query.trim().to_lowercase();

    let mut listed: Vec<Service> = services
        .iter()
        .filter(|s| {
            owners
                .get(s.user_id.as_str())
                .is_some_and(|u| u.is_approved_provider())
        })
        .filter(|s| needle.is_empty() || s.category.to_lowercase().contains(&needle))
        .cloned()
        .map(|mut s| {
            if s.provider_name.is_none() {
                s.provider_name = owners.get(s.user_id.as_str()).map(|u| u.name.clone());
            }
            s
        })
        .collect();

    listed.sort_by(|a, b| {
        a.service_name
            .to_lowercase()
            .cmp(&b.service_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    listed
}
