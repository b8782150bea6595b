//! Online presence of the signed-in user

use chrono::Utc;
use serde_json::json;

use super::client::HiveClient;
use crate::error::Result;
use crate::source::{Collection, RecordSource};

impl<S: RecordSource> HiveClient<S> {
    /// Mark the viewer online or offline and stamp `lastSeen`.
    pub async fn set_presence(&self, online: bool) -> Result<()> {
        let fields = json!({
            "isOnline": online,
            "lastSeen": Utc::now(),
        });
        self.write_model(Collection::Users, Some(&self.viewer().id), &fields)
            .await?;
        tracing::debug!(
            "Presence of {} set to {}",
            self.viewer().id,
            if online { "online" } else { "offline" }
        );
        Ok(())
    }
}
