//! Booking actions

use chrono::{DateTime, Utc};

use super::{client::HiveClient, require_confirmation, Confirmation};
use crate::error::{HiveError, Result};
use crate::live::BookingFeed;
use crate::models::{Booking, BookingStatus, Service, User};
use crate::projection::{authorize_transition, BookingView};
use crate::source::{get_as, Collection, Fields, RecordSource};

/// Provider name stored on a booking when the owner's profile is missing.
const UNKNOWN_PROVIDER: &str = "Unknown";

impl<S: RecordSource> HiveClient<S> {
    /// Book `service_id` for `when`. The booking starts out `Pending`.
    pub async fn place_booking(&self, service_id: &str, when: DateTime<Utc>) -> Result<Booking> {
        let service: Service = self
            .require(Collection::Services, "service", service_id)
            .await?;
        if service.user_id.trim().is_empty() {
            return Err(HiveError::Validation(
                "This service has no provider and can't be booked.".to_string(),
            ));
        }

        let provider_name = match get_as::<_, User>(self.source(), Collection::Users, &service.user_id)
            .await
        {
            Ok(Some(owner)) if !owner.name.trim().is_empty() => owner.name,
            Ok(_) => UNKNOWN_PROVIDER.to_string(),
            Err(e) => {
                tracing::warn!("Provider lookup for {} failed: {}", service.user_id, e);
                UNKNOWN_PROVIDER.to_string()
            }
        };

        let viewer = &self.viewer().id;
        let mut booking = Booking {
            id: String::new(),
            user_id: viewer.clone(),
            provider_id: service.user_id.clone(),
            participants: vec![viewer.clone(), service.user_id.clone()],
            service_id: service_id.to_string(),
            service_name: service.service_name,
            provider_name,
            status: BookingStatus::Pending,
            booking_date_time: when,
            created_at: Utc::now(),
        };
        booking.id = self
            .write_model(Collection::Bookings, None, &booking)
            .await?;
        tracing::info!(
            "Booked {} with {} for {}",
            booking.service_name,
            booking.provider_name,
            when
        );
        Ok(booking)
    }

    /// Move a booking to `target` on behalf of the viewer.
    ///
    /// Canceling and rejecting need a [`Confirmation`]. Only the status
    /// field is written; on any error the stored booking is unchanged.
    pub async fn transition_booking(
        &self,
        booking_id: &str,
        target: BookingStatus,
        confirm: Option<Confirmation>,
    ) -> Result<Booking> {
        let mut booking: Booking = self
            .require(Collection::Bookings, "booking", booking_id)
            .await?;
        authorize_transition(&booking, &self.viewer().id, target)?;
        if matches!(target, BookingStatus::Canceled | BookingStatus::Rejected) {
            let what = match target {
                BookingStatus::Canceled => "Canceling a booking",
                _ => "Rejecting a booking",
            };
            require_confirmation(confirm, what)?;
        }

        let mut fields = Fields::new();
        fields.insert("status".to_string(), target.as_str().into());
        self.write_fields(Collection::Bookings, Some(booking_id), fields)
            .await?;

        tracing::info!("Booking {}: {} -> {}", booking_id, booking.status, target);
        booking.status = target;
        Ok(booking)
    }

    /// Current bookings of the viewer, split into own and incoming.
    pub async fn bookings(&self) -> Result<BookingView> {
        self.booking_feed()?.next().await
    }

    pub fn booking_feed(&self) -> Result<BookingFeed> {
        BookingFeed::open(self.source(), self.viewer().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestStatus, ServiceStatus};
    use crate::source::MemoryStore;
    use crate::viewer::{Role, Viewer};
    use chrono::TimeZone;

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(
                Collection::Users,
                "B",
                &User {
                    name: "Bea".into(),
                    is_service_provider: true,
                    request_status: RequestStatus::Approved,
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .insert(
                Collection::Services,
                "s1",
                &Service {
                    id: String::new(),
                    user_id: "B".into(),
                    service_name: "Deep clean".into(),
                    category: "Cleaning".into(),
                    description: "Whole flat".into(),
                    price_range: "50-80".into(),
                    availability: "Weekdays".into(),
                    status: ServiceStatus::Approved,
                    provider_name: None,
                    created_at: None,
                },
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_place_booking_fills_names_and_participants() {
        let store = seeded();
        let ann = HiveClient::new(store.clone(), Viewer::customer("A"));
        let booking = ann.place_booking("s1", when()).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.provider_name, "Bea");
        assert_eq!(booking.service_name, "Deep clean");
        assert_eq!(booking.participants, vec!["A".to_string(), "B".to_string()]);

        let stored: Booking = get_as(&store, Collection::Bookings, &booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, booking);
    }

    #[tokio::test]
    async fn test_place_booking_unknown_service_and_owner() {
        let store = seeded();
        let ann = HiveClient::new(store.clone(), Viewer::customer("A"));
        assert!(matches!(
            ann.place_booking("missing", when()).await,
            Err(HiveError::NotFound { kind: "service", .. })
        ));

        store
            .insert(
                Collection::Services,
                "s2",
                &serde_json::json!({"userId": "ghost", "serviceName": "Gutters"}),
            )
            .unwrap();
        let booking = ann.place_booking("s2", when()).await.unwrap();
        assert_eq!(booking.provider_name, "Unknown");
    }

    #[tokio::test]
    async fn test_confirm_then_cancel_leaves_confirmed() {
        let store = seeded();
        let ann = HiveClient::new(store.clone(), Viewer::customer("A"));
        let bea = HiveClient::new(store.clone(), Viewer::new("B", Role::Provider));
        let booking = ann.place_booking("s1", when()).await.unwrap();

        let confirmed = bea
            .transition_booking(&booking.id, BookingStatus::Confirmed, None)
            .await
            .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let err = ann
            .transition_booking(
                &booking.id,
                BookingStatus::Canceled,
                Some(Confirmation::confirmed()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::InvalidTransition { .. }));

        let view = ann.bookings().await.unwrap();
        assert_eq!(view.mine[0].booking.status, BookingStatus::Confirmed);
        assert!(view.mine[0].actions.is_empty());
    }

    #[tokio::test]
    async fn test_outsider_and_unconfirmed_cancel_write_nothing() {
        let store = seeded();
        let ann = HiveClient::new(store.clone(), Viewer::customer("A"));
        let eve = HiveClient::new(store.clone(), Viewer::customer("E"));
        let booking = ann.place_booking("s1", when()).await.unwrap();

        assert!(matches!(
            eve.transition_booking(
                &booking.id,
                BookingStatus::Canceled,
                Some(Confirmation::confirmed())
            )
            .await,
            Err(HiveError::Unauthorized(_))
        ));
        assert!(matches!(
            ann.transition_booking(&booking.id, BookingStatus::Canceled, None)
                .await,
            Err(HiveError::Validation(_))
        ));

        let stored: Booking = get_as(&store, Collection::Bookings, &booking.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);

        let canceled = ann
            .transition_booking(
                &booking.id,
                BookingStatus::Canceled,
                Some(Confirmation::confirmed()),
            )
            .await
            .unwrap();
        assert!(canceled.status.is_terminal());
    }

    #[tokio::test]
    async fn test_missing_booking_is_not_found() {
        let client = HiveClient::new(MemoryStore::new(), Viewer::customer("A"));
        let err = client
            .transition_booking("nope", BookingStatus::Confirmed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, HiveError::NotFound { kind: "booking", .. }));
    }
}
