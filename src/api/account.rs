//! Account records created at sign-up and verified at sign-in

use chrono::Utc;
use serde_json::json;

use super::required;
use crate::auth::Identity;
use crate::error::{HiveError, Result};
use crate::models::User;
use crate::source::{encode, get_as, Collection, RecordSource};

/// Create the `users/{uid}` record for a freshly registered account.
///
/// The record starts unverified; `mark_verified` flips it on the first
/// sign-in with a verified email.
pub async fn sign_up<S: RecordSource>(
    source: &S,
    uid: &str,
    name: &str,
    email: &str,
) -> Result<User> {
    let uid = required(uid, "User id")?;
    let name = required(name, "Name")?;
    let email = required(email, "Email")?;
    if !email.contains('@') {
        return Err(HiveError::Validation(format!(
            "{} is not a valid email address.",
            email
        )));
    }
    if get_as::<_, User>(source, Collection::Users, uid).await?.is_some() {
        return Err(HiveError::Validation(format!(
            "An account for {} already exists.",
            uid
        )));
    }

    let user = User {
        id: uid.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        is_verified: false,
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    let fields = encode(&json!({
        "uid": uid,
        "name": user.name,
        "email": user.email,
        "isVerified": false,
        "createdAt": user.created_at,
    }))?;
    source
        .write(Collection::Users, Some(uid), fields)
        .await
        .inspect_err(|e| tracing::warn!("Creating account {} failed: {}", uid, e))?;
    tracing::info!("Created account {} ({})", uid, user.email);
    Ok(user)
}

/// Record that `identity` signed in with a verified email.
///
/// Returns whether the user record changed. A missing record is left
/// alone.
pub async fn mark_verified<S: RecordSource>(source: &S, identity: &Identity) -> Result<bool> {
    if !identity.email_verified {
        return Err(HiveError::Unauthorized(format!(
            "Email {} is not verified.",
            identity.email
        )));
    }
    let Some(user) = get_as::<_, User>(source, Collection::Users, &identity.uid).await? else {
        tracing::debug!("No account record for {}", identity.uid);
        return Ok(false);
    };
    if user.is_verified {
        return Ok(false);
    }

    let fields = encode(&json!({ "isVerified": true }))?;
    source
        .write(Collection::Users, Some(identity.uid.as_str()), fields)
        .await?;
    tracing::info!("Account {} is now verified", identity.uid);
    Ok(true)
}
