//! Booking-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking lifecycle status
///
/// Pending -> Confirmed | Rejected | Canceled, Confirmed -> Completed.
/// Rejected, Canceled and Completed are terminal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Canceled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Canceled => "Canceled",
            BookingStatus::Completed => "Completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Canceled | BookingStatus::Completed
        )
    }

    /// Whether the status graph has an edge from `self` to `next`.
    ///
    /// Says nothing about who may take that edge.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (
                BookingStatus::Pending,
                BookingStatus::Confirmed | BookingStatus::Rejected | BookingStatus::Canceled
            ) | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's booking of a provider's service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: String,
    /// Requesting customer
    pub user_id: String,
    /// Assigned provider
    pub provider_id: String,
    pub participants: Vec<String>,
    pub service_id: String,
    pub service_name: String,
    pub provider_name: String,
    #[serde(default)]
    pub status: BookingStatus,
    pub booking_date_time: DateTime<Utc>,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_visible_to(&self, id: &str) -> bool {
        self.participants.iter().any(|p| p == id)
    }
}
