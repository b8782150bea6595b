//! Login and logout against an identity store

use anyhow::{ensure, Result};

use super::{Identity, IdentityStore};

/// What `login` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn,
    /// A verified identity was already stored and `force` was not set.
    AlreadySignedIn,
}

/// Store `identity` as the signed-in user.
///
/// An unverified email is refused and leaves the store untouched.
pub fn login<S: IdentityStore + ?Sized>(
    store: &mut S,
    identity: Identity,
    force: bool,
) -> Result<LoginOutcome> {
    ensure!(!identity.uid.trim().is_empty(), "User id must not be empty");
    ensure!(
        identity.email_verified,
        "Email {} is not verified. Verify it before signing in.",
        identity.email
    );

    if !force {
        if let Some(current) = store.get_identity() {
            if current.email_verified && current.uid == identity.uid {
                tracing::debug!("{} already signed in", current.uid);
                return Ok(LoginOutcome::AlreadySignedIn);
            }
        }
    }

    tracing::info!("Signed in as {}", identity.email);
    store.set_identity(identity);
    Ok(LoginOutcome::SignedIn)
}

pub fn logout<S: IdentityStore + ?Sized>(store: &mut S) {
    if let Some(identity) = store.get_identity() {
        tracing::info!("Signing out {}", identity.email);
    }
    store.clear_identity();
}
