//! Error taxonomy for projections and actions

use thiserror::Error;

use crate::models::BookingStatus;

/// Errors surfaced by actions against the record source.
///
/// Projections never return these; missing references degrade to
/// placeholders instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HiveError {
    /// Referenced record (profile, service, booking, user) does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The acting identity lacks the role required for this operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Booking status change not allowed from the current status.
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Required input missing or malformed; the write was not attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Record source failure (subscription dropped, write failed).
    #[error("record source error: {0}")]
    Transient(String),
}

impl HiveError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        HiveError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HiveError::Transient(_))
    }

    /// Short message suitable for an alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            HiveError::NotFound { kind, .. } => format!("That {} no longer exists.", kind),
            HiveError::Unauthorized(msg) => msg.clone(),
            HiveError::InvalidTransition { from, .. } => {
                format!("This booking is already {} and can't be changed.", from)
            }
            HiveError::Validation(msg) => msg.clone(),
            HiveError::Transient(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, HiveError>;
