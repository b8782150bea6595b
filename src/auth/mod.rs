//! Authentication for HelperHive
//!
//! Sign-in itself belongs to the hosted backend. The client only keeps the
//! resulting identity and refuses to act for an unverified email.

pub mod identity;
pub mod session;

pub use identity::{Identity, IdentityStore};
pub use session::{login, logout, LoginOutcome};

use crate::error::{HiveError, Result};

/// Source of the currently signed-in identity.
pub trait Authenticator {
    fn current_identity(&self) -> Option<Identity>;
}

/// Authenticator with a fixed identity, for tests and scripted use.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl Authenticator for StaticAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

/// The identity actions may run as.
///
/// Fails with `Unauthorized` when nobody is signed in or the email has not
/// been verified yet.
pub fn signed_in<A: Authenticator + ?Sized>(auth: &A) -> Result<Identity> {
    let identity = auth.current_identity().ok_or_else(|| {
        HiveError::Unauthorized("Not signed in. Run 'helperhive login'.".to_string())
    })?;
    if !identity.email_verified {
        tracing::warn!("Refusing unverified account {}", identity.email);
        return Err(HiveError::Unauthorized(
            "Please verify your email before signing in.".to_string(),
        ));
    }
    Ok(identity)
}
