//! HelperHive client core
//!
//! Projections that turn the hosted backend's record streams into the
//! views of the HelperHive app (inbox, bookings, admin queues, catalog),
//! the booking state machine, and the validated actions that write back.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod live;
pub mod models;
pub mod projection;
pub mod source;
pub mod viewer;

pub use error::{HiveError, Result};
pub use viewer::{Role, Viewer};
