//! Profile completion: the request to become a service provider

use serde::Serialize;

use super::{client::HiveClient, required};
use crate::error::{HiveError, Result};
use crate::models::{RequestStatus, User};
use crate::source::{get_as, Collection, RecordSource};

/// Details a user submits when asking to become a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub date_of_birth: String,
    pub experience: String,
    pub id_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl ProfileForm {
    /// Copy with every field trimmed, or the first missing required field.
    fn validated(&self) -> Result<Self> {
        let optional = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        Ok(Self {
            name: required(&self.name, "Name")?.to_string(),
            last_name: optional(&self.last_name),
            email: required(&self.email, "Email")?.to_string(),
            phone: required(&self.phone, "Phone")?.to_string(),
            address: required(&self.address, "Address")?.to_string(),
            city: required(&self.city, "City")?.to_string(),
            country: required(&self.country, "Country")?.to_string(),
            date_of_birth: required(&self.date_of_birth, "Date of birth")?.to_string(),
            experience: required(&self.experience, "Experience")?.to_string(),
            id_number: required(&self.id_number, "ID number")?.to_string(),
            profile_image: optional(&self.profile_image),
        })
    }
}

/// Stored shape of a provider request: the form plus the review flags.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderRequest<'a> {
    #[serde(flatten)]
    form: &'a ProfileForm,
    is_service_provider: bool,
    request_status: RequestStatus,
}

impl<S: RecordSource> HiveClient<S> {
    /// Submit the viewer's profile for provider review.
    ///
    /// Refused while an earlier request is still pending. Returns the
    /// updated profile.
    pub async fn complete_profile(&self, form: &ProfileForm) -> Result<User> {
        let form = form.validated()?;
        let uid = &self.viewer().id;

        let existing: Option<User> = get_as(self.source(), Collection::Users, uid).await?;
        if existing.is_some_and(|u| u.request_status == RequestStatus::Pending) {
            return Err(HiveError::Validation(
                "Your request is already pending review.".to_string(),
            ));
        }

        let request = ProviderRequest {
            form: &form,
            is_service_provider: false,
            request_status: RequestStatus::Pending,
        };
        self.write_model(Collection::Users, Some(uid), &request)
            .await?;
        tracing::info!("Profile of {} submitted for review", uid);

        self.require(Collection::Users, "user", uid).await
    }
}
