//! Viewer-bound client over a record source
//!
//! Wraps a `RecordSource` with the identity of the signed-in viewer. Every
//! action goes through here so failures are logged before being surfaced.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{HiveError, Result};
use crate::models::User;
use crate::source::{encode, get_as, Collection, RecordSource};
use crate::viewer::{Role, Viewer};

/// Client acting on behalf of one viewer.
pub struct HiveClient<S> {
    source: S,
    viewer: Viewer,
}

impl<S: RecordSource> HiveClient<S> {
    pub fn new(source: S, viewer: Viewer) -> Self {
        Self { source, viewer }
    }

    /// Build a client for `uid`, deriving the role from the stored profile.
    ///
    /// A missing or unreadable profile degrades to the customer role.
    pub async fn connect(source: S, uid: &str) -> Result<Self> {
        if uid.trim().is_empty() {
            return Err(HiveError::Unauthorized(
                "Not signed in. Run 'helperhive login'.".to_string(),
            ));
        }
        let viewer = resolve_viewer(&source, uid).await;
        tracing::debug!("Connected as {} ({})", viewer.id, viewer.role.as_str());
        Ok(Self::new(source, viewer))
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch a record, mapping absence to `NotFound`.
    pub(crate) async fn require<T: DeserializeOwned>(
        &self,
        collection: Collection,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        get_as(&self.source, collection, id)
            .await
            .inspect_err(|e| tracing::warn!("Reading {} {} failed: {}", kind, id, e))?
            .ok_or_else(|| HiveError::not_found(kind, id))
    }

    /// Serialize `value` and merge it into the collection.
    pub(crate) async fn write_model<T: Serialize>(
        &self,
        collection: Collection,
        id: Option<&str>,
        value: &T,
    ) -> Result<String> {
        let fields = encode(value)?;
        self.write_fields(collection, id, fields).await
    }

    pub(crate) async fn write_fields(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: crate::source::Fields,
    ) -> Result<String> {
        self.source
            .write(collection, id, fields)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    "Write to {}/{} failed: {}",
                    collection,
                    id.unwrap_or("<new>"),
                    e
                )
            })
    }
}

/// Role of `uid` according to its profile, or `Customer` if it can't be read.
pub async fn resolve_viewer<S: RecordSource>(source: &S, uid: &str) -> Viewer {
    match get_as::<_, User>(source, Collection::Users, uid).await {
        Ok(Some(user)) => Viewer::from_user(&user),
        Ok(None) => {
            tracing::debug!("No profile for {}, treating as customer", uid);
            Viewer::customer(uid)
        }
        Err(e) => {
            tracing::warn!("Profile lookup for {} failed: {}", uid, e);
            Viewer::new(uid, Role::Customer)
        }
    }
}
