//! Pure projections from raw records to view-ready state
//!
//! Every function here is synchronous and side-effect free apart from
//! logging. Callers re-run them on each snapshot from the record source.

mod admin;
mod bookings;
mod catalog;
mod conversations;
mod reviews;
mod thread;

pub use admin::{project_admin_queues, AdminQueues};
pub use bookings::{
    allowed_transitions, apply_transition, authorize_transition, project_bookings, BookingItem,
    BookingRole, BookingView,
};
pub use catalog::project_catalog;
pub use conversations::{project_conversations, Conversation, ProfileLookup, ProfileSnapshot};
pub use reviews::{project_reviews, ReviewSummary};
pub use thread::{presence_line, project_thread};

use std::collections::HashMap;

use crate::models::User;

/// Index user records by id for owner lookups.
pub(crate) fn index_users(users: &[User]) -> HashMap<&str, &User> {
    users.iter().map(|u| (u.id.as_str(), u)).collect()
}
