//! Service listing, catalog and review actions

use chrono::Utc;
use serde_json::json;

use super::{client::HiveClient, required};
use crate::error::{HiveError, Result};
use crate::models::{RequestStatus, Review, Service, ServiceStatus, User, RATING_RANGE};
use crate::projection::{project_catalog, project_reviews, ReviewSummary};
use crate::source::{get_as, list_as, Collection, Filter, RecordSource};

/// Input of the "offer a service" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceForm {
    pub service_name: String,
    pub category: String,
    pub description: String,
    pub price_range: String,
    pub availability: String,
}

impl<S: RecordSource> HiveClient<S> {
    /// List a new service owned by the viewer.
    ///
    /// An approved provider's service is approved at once. Anyone else gets
    /// a pending service and a pending provider request; the request is
    /// filed before the service is written, so retrying after a failed
    /// write never leaves a duplicate service behind.
    pub async fn register_service(&self, form: &ServiceForm) -> Result<Service> {
        let service_name = required(&form.service_name, "Service name")?;
        let category = required(&form.category, "Category")?;
        let description = required(&form.description, "Description")?;
        let price_range = required(&form.price_range, "Price range")?;
        let availability = required(&form.availability, "Availability")?;

        let status = if self.viewer().role.can_offer_services() {
            ServiceStatus::Approved
        } else {
            self.request_provider_status().await?;
            ServiceStatus::Pending
        };

        let mut service = Service {
            id: String::new(),
            user_id: self.viewer().id.clone(),
            service_name: service_name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            price_range: price_range.to_string(),
            availability: availability.to_string(),
            status,
            provider_name: None,
            created_at: Some(Utc::now()),
        };
        service.id = self
            .write_model(Collection::Services, None, &service)
            .await?;
        tracing::info!("Registered service {} ({})", service.service_name, service.id);
        Ok(service)
    }

    async fn request_provider_status(&self) -> Result<()> {
        let uid = &self.viewer().id;
        let user: Option<User> = get_as(self.source(), Collection::Users, uid).await?;
        if user.is_some_and(|u| u.request_status != RequestStatus::None) {
            return Ok(());
        }
        let fields = json!({ "requestStatus": RequestStatus::Pending });
        self.write_model(Collection::Users, Some(uid), &fields)
            .await?;
        tracing::info!("Provider request for {} is now pending", uid);
        Ok(())
    }

    /// Bookable services, optionally narrowed to a category.
    pub async fn catalog(&self, query: &str) -> Result<Vec<Service>> {
        let services: Vec<Service> =
            list_as(self.source(), Collection::Services, Filter::All).await?;
        let users: Vec<User> = list_as(self.source(), Collection::Users, Filter::All).await?;
        Ok(project_catalog(&services, &users, query))
    }

    pub async fn reviews(&self, service_id: &str) -> Result<ReviewSummary> {
        let reviews: Vec<Review> = list_as(
            self.source(),
            Collection::Reviews,
            Filter::equals("serviceId", service_id),
        )
        .await?;
        Ok(project_reviews(&reviews, service_id))
    }

    /// Rate a service from 1 to 5 stars with a short text.
    pub async fn submit_review(&self, service_id: &str, rating: u8, text: &str) -> Result<Review> {
        if !RATING_RANGE.contains(&rating) {
            return Err(HiveError::Validation(format!(
                "Rating must be between {} and {}.",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }
        let text = required(text, "Review")?;
        let _service: Service = self
            .require(Collection::Services, "service", service_id)
            .await?;

        let mut review = Review {
            id: String::new(),
            service_id: service_id.to_string(),
            user_id: self.viewer().id.clone(),
            rating,
            text: text.to_string(),
            timestamp: Utc::now(),
        };
        review.id = self.write_model(Collection::Reviews, None, &review).await?;
        Ok(review)
    }
}
