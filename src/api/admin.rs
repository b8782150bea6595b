//! Admin moderation of provider requests

use serde_json::json;

use super::{client::HiveClient, require_confirmation, Confirmation};
use crate::error::{HiveError, Result};
use crate::live::AdminFeed;
use crate::models::{RequestStatus, Service, ServiceStatus, User};
use crate::projection::AdminQueues;
use crate::source::{list_as, Collection, Filter, RecordSource};

impl<S: RecordSource> HiveClient<S> {
    fn require_admin(&self) -> Result<()> {
        if !self.viewer().role.can_moderate() {
            tracing::warn!("{} attempted an admin action", self.viewer().id);
            return Err(HiveError::Unauthorized(
                "Only admins can review provider requests.".to_string(),
            ));
        }
        Ok(())
    }

    /// Approve `user_id` as a service provider. Approving twice is a no-op.
    ///
    /// The user's pending services are approved with them. They are written
    /// before the user so a failed approval can simply be retried.
    pub async fn approve_provider(&self, user_id: &str) -> Result<User> {
        self.require_admin()?;
        let mut user: User = self.require(Collection::Users, "user", user_id).await?;
        if user.is_approved_provider() {
            tracing::debug!("{} is already an approved provider", user_id);
            return Ok(user);
        }

        let services: Vec<Service> = list_as(
            self.source(),
            Collection::Services,
            Filter::equals("userId", user_id),
        )
        .await?;
        for service in services.iter().filter(|s| s.status == ServiceStatus::Pending) {
            self.write_model(
                Collection::Services,
                Some(service.id.as_str()),
                &json!({ "status": ServiceStatus::Approved }),
            )
            .await?;
            tracing::debug!("Approved service {} of {}", service.id, user_id);
        }

        let fields = json!({
            "isServiceProvider": true,
            "requestStatus": RequestStatus::Approved,
        });
        self.write_model(Collection::Users, Some(user_id), &fields)
            .await?;
        tracing::info!("Approved provider {}", user_id);

        user.is_service_provider = true;
        user.request_status = RequestStatus::Approved;
        Ok(user)
    }

    /// Reject a provider request by deleting the user record.
    pub async fn reject_provider(&self, user_id: &str, confirm: Option<Confirmation>) -> Result<()> {
        self.require_admin()?;
        require_confirmation(confirm, "Rejecting a user")?;
        let _user: User = self.require(Collection::Users, "user", user_id).await?;

        self.source()
            .delete(Collection::Users, user_id)
            .await
            .inspect_err(|e| tracing::warn!("Deleting user {} failed: {}", user_id, e))?;
        tracing::info!("Rejected and removed user {}", user_id);
        Ok(())
    }

    /// Current approval queues.
    pub async fn admin_queues(&self) -> Result<AdminQueues> {
        self.admin_feed()?.next().await
    }

    pub fn admin_feed(&self) -> Result<AdminFeed> {
        AdminFeed::open(self.source(), self.viewer())
    }
}
