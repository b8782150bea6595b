//! Client actions against the record source
//!
//! Each action validates its input and checks the viewer's rights before
//! writing. A refused action writes nothing.

mod account;
mod admin;
mod bookings;
mod chat;
mod client;
mod presence;
mod profile;
mod services;

pub use account::{mark_verified, sign_up};
pub use client::{resolve_viewer, HiveClient};
pub use profile::ProfileForm;
pub use services::ServiceForm;

use crate::error::{HiveError, Result};

/// Explicit acknowledgement required by destructive actions.
///
/// Only obtainable through [`Confirmation::confirmed`], so a caller has to
/// ask for it on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    pub fn confirmed() -> Self {
        Confirmation(())
    }

    /// `Some` when the user answered yes (e.g. passed `--yes`).
    pub fn from_flag(yes: bool) -> Option<Self> {
        yes.then(Self::confirmed)
    }
}

fn require_confirmation(confirm: Option<Confirmation>, what: &str) -> Result<()> {
    match confirm {
        Some(_) => Ok(()),
        None => Err(HiveError::Validation(format!(
            "{} needs to be confirmed.",
            what
        ))),
    }
}

/// Trimmed value of a required text field, or a validation error naming it.
fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(HiveError::Validation(format!("{} is required.", field)));
    }
    Ok(value)
}
