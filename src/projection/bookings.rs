//! Booking projection and the role-checked status machine

use serde::Serialize;

use crate::error::{HiveError, Result};
use crate::models::{Booking, BookingStatus};
use crate::viewer::Viewer;

/// Which side of a booking the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingRole {
    /// Placed the booking ("your booking")
    Requester,
    /// Assigned to fulfil it ("incoming request")
    Provider,
}

/// A booking as rendered for one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingItem {
    pub booking: Booking,
    pub role: BookingRole,
    /// Transitions the viewer may perform right now
    pub actions: Vec<BookingStatus>,
}

/// Bookings visible to the viewer, split by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingView {
    pub mine: Vec<BookingItem>,
    pub incoming: Vec<BookingItem>,
    /// Corrupt records naming the viewer as participant but neither as
    /// requester nor provider. Shown read-only.
    pub unassigned: Vec<Booking>,
}

impl BookingView {
    pub fn is_empty(&self) -> bool {
        self.mine.is_empty() && self.incoming.is_empty() && self.unassigned.is_empty()
    }
}

/// Targets each role may move a booking to, status permitting.
fn role_targets(role: BookingRole) -> &'static [BookingStatus] {
    match role {
        BookingRole::Requester => &[BookingStatus::Canceled],
        BookingRole::Provider => &[
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Completed,
        ],
    }
}

/// Split the bookings the viewer participates in into "mine" and "incoming".
///
/// A booking whose requester is also its provider shows up in both lists.
/// Both lists are ordered by booking time, then id.
pub fn project_bookings(bookings: &[Booking], viewer: &Viewer) -> BookingView {
    let mut view = BookingView::default();

    for booking in bookings.iter().filter(|b| b.is_visible_to(&viewer.id)) {
        if booking.user_id == viewer.id {
            view.mine.push(item_for(booking, BookingRole::Requester));
        }
        if booking.provider_id == viewer.id {
            view.incoming.push(item_for(booking, BookingRole::Provider));
        }
        if booking.user_id != viewer.id && booking.provider_id != viewer.id {
            tracing::warn!(
                "Booking {} lists {} as participant without a role",
                booking.id,
                viewer.id
            );
            view.unassigned.push(booking.clone());
        }
    }

    let by_time = |a: &BookingItem, b: &BookingItem| {
        a.booking
            .booking_date_time
            .cmp(&b.booking.booking_date_time)
            .then_with(|| a.booking.id.cmp(&b.booking.id))
    };
    view.mine.sort_by(by_time);
    view.incoming.sort_by(by_time);
    view.unassigned.sort_by(|a, b| {
        a.booking_date_time
            .cmp(&b.booking_date_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    view
}

fn item_for(booking: &Booking, role: BookingRole) -> BookingItem {
    let actions = role_targets(role)
        .iter()
        .copied()
        .filter(|t| booking.status.can_transition_to(*t))
        .collect();
    BookingItem {
        booking: booking.clone(),
        role,
        actions,
    }
}

/// Transitions `actor` may perform on `booking` in its current status.
pub fn allowed_transitions(booking: &Booking, actor: &str) -> Vec<BookingStatus> {
    let mut targets = Vec::new();
    if booking.user_id == actor {
        targets.extend_from_slice(role_targets(BookingRole::Requester));
    }
    if booking.provider_id == actor {
        targets.extend_from_slice(role_targets(BookingRole::Provider));
    }
    targets.retain(|t| booking.status.can_transition_to(*t));
    targets
}

/// Check that `actor` may move `booking` to `target`.
///
/// Outsiders and participants asking for the other role's transition get
/// `Unauthorized`; a permitted role asking for an edge the current status
/// lacks gets `InvalidTransition`.
pub fn authorize_transition(booking: &Booking, actor: &str, target: BookingStatus) -> Result<()> {
    let is_requester = booking.user_id == actor;
    let is_provider = booking.provider_id == actor;

    if !is_requester && !is_provider {
        return Err(HiveError::Unauthorized(
            "Only the customer or the provider of this booking can change it.".to_string(),
        ));
    }

    let permitted = (is_requester && role_targets(BookingRole::Requester).contains(&target))
        || (is_provider && role_targets(BookingRole::Provider).contains(&target));
    if !permitted {
        let msg = match target {
            BookingStatus::Canceled => "Only the customer who booked can cancel this booking.",
            BookingStatus::Pending => "A booking can't be moved back to Pending.",
            _ => "Only the assigned provider can accept, reject or complete this booking.",
        };
        return Err(HiveError::Unauthorized(msg.to_string()));
    }

    if !booking.status.can_transition_to(target) {
        return Err(HiveError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }
    Ok(())
}

/// Apply a transition in place. On error the booking is left untouched.
pub fn apply_transition(booking: &mut Booking, actor: &str, target: BookingStatus) -> Result<()> {
    authorize_transition(booking, actor, target)?;
    tracing::debug!(
        "Booking {}: {} -> {} by {}",
        booking.id,
        booking.status,
        target,
        actor
    );
    booking.status = target;
    Ok(())
}
