//! Live view models
//!
//! Each feed owns the subscriptions behind one screen and re-runs the
//! matching projection whenever any of them delivers a snapshot, in
//! whatever order they arrive. Dropping a feed releases all of its
//! subscriptions.

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{HashMap, HashSet};
use tokio_stream::StreamMap;

use crate::error::{HiveError, Result};
use crate::models::{Booking, Message, Service, User};
use crate::projection::{
    presence_line, project_admin_queues, project_bookings, project_conversations, project_thread,
    AdminQueues, BookingView, Conversation,
};
use crate::source::{Collection, Filter, RecordSource, Snapshot, Subscription};
use crate::viewer::Viewer;

/// Which of a feed's two subscriptions produced the update.
enum Update {
    Primary(Snapshot),
    Secondary(Snapshot),
}

/// Wait for the next snapshot from either subscription.
///
/// A subscription that ends is reported as a transient error; the caller
/// keeps its last projected state.
async fn next_update(primary: &mut Subscription, secondary: &mut Subscription) -> Result<Update> {
    let (first, second) = (primary.collection(), secondary.collection());
    tokio::select! {
        snap = primary.next() => snap.map(Update::Primary).ok_or_else(|| closed(first)),
        snap = secondary.next() => snap.map(Update::Secondary).ok_or_else(|| closed(second)),
    }
}

fn closed(collection: Collection) -> HiveError {
    tracing::warn!("{} subscription closed by source", collection);
    HiveError::Transient(format!("{} subscription closed", collection))
}

/// Profile subscription of one counterparty. Yields `None` once before
/// ending if the source closes it.
type ProfileStream = BoxStream<'static, Option<Snapshot>>;

fn watch_profile(subscription: Subscription) -> ProfileStream {
    subscription
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .boxed()
}

/// Inbox screen: conversations of the viewer, refreshed on message changes
/// or on a change to one of the counterparties' profiles.
///
/// Holds one profile subscription per counterparty, opened and released
/// as conversations come and go.
pub struct InboxFeed<'a, S> {
    source: &'a S,
    viewer: Viewer,
    messages: Subscription,
    profiles: StreamMap<String, ProfileStream>,
    latest_messages: Option<Vec<Message>>,
    latest_profiles: HashMap<String, Option<User>>,
}

impl<'a, S: RecordSource> InboxFeed<'a, S> {
    pub fn open(source: &'a S, viewer: Viewer) -> Result<Self> {
        let messages = source.subscribe(
            Collection::Messages,
            Filter::contains("participants", viewer.id.clone()),
        )?;
        Ok(Self {
            source,
            viewer,
            messages,
            profiles: StreamMap::new(),
            latest_messages: None,
            latest_profiles: HashMap::new(),
        })
    }

    /// Next inbox state. Waits until the messages and every counterparty's
    /// profile have loaded.
    pub async fn next(&mut self) -> Result<Vec<Conversation>> {
        loop {
            tokio::select! {
                snap = self.messages.next() => {
                    let messages: Vec<Message> =
                        snap.ok_or_else(|| closed(Collection::Messages))?.decode_all();
                    self.follow_counterparties(&messages)?;
                    self.latest_messages = Some(messages);
                }
                Some((id, snap)) = self.profiles.next(), if !self.profiles.is_empty() => {
                    let snap = snap.ok_or_else(|| closed(Collection::Users))?;
                    let profile = snap.decode_all::<User>().into_iter().next();
                    self.latest_profiles.insert(id, profile);
                }
            }
            let Some(messages) = &self.latest_messages else {
                continue;
            };
            if self
                .profiles
                .keys()
                .all(|id| self.latest_profiles.contains_key(id))
            {
                return Ok(project_conversations(
                    messages,
                    &self.latest_profiles,
                    &self.viewer,
                ));
            }
        }
    }

    /// Subscribe to new counterparties and release the ones no longer in
    /// the message set.
    fn follow_counterparties(&mut self, messages: &[Message]) -> Result<()> {
        let wanted: HashSet<&str> = messages
            .iter()
            .filter_map(|m| m.counterparty(&self.viewer.id))
            .collect();

        let stale: Vec<String> = self
            .profiles
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.profiles.remove(&id);
            self.latest_profiles.remove(&id);
        }

        for id in wanted {
            if !self.profiles.contains_key(id) {
                let subscription = self.source.subscribe(Collection::Users, Filter::id(id))?;
                self.profiles.insert(id.to_string(), watch_profile(subscription));
            }
        }
        Ok(())
    }
}

/// Bookings screen: the viewer's own bookings and incoming requests.
pub struct BookingFeed {
    viewer: Viewer,
    bookings: Subscription,
}

impl BookingFeed {
    pub fn open<S: RecordSource>(source: &S, viewer: Viewer) -> Result<Self> {
        let bookings = source.subscribe(
            Collection::Bookings,
            Filter::contains("participants", viewer.id.clone()),
        )?;
        Ok(Self { viewer, bookings })
    }

    pub async fn next(&mut self) -> Result<BookingView> {
        let snap = self
            .bookings
            .next()
            .await
            .ok_or_else(|| closed(Collection::Bookings))?;
        let bookings: Vec<Booking> = snap.decode_all();
        Ok(project_bookings(&bookings, &self.viewer))
    }
}

/// Admin dashboard: approval queues over all users and services.
pub struct AdminFeed {
    users: Subscription,
    services: Subscription,
    latest_users: Option<Vec<User>>,
    latest_services: Option<Vec<Service>>,
}

impl AdminFeed {
    /// Only admins may open the dashboard.
    pub fn open<S: RecordSource>(source: &S, viewer: &Viewer) -> Result<Self> {
        if !viewer.role.can_moderate() {
            return Err(HiveError::Unauthorized(
                "The admin dashboard is only available to admins.".to_string(),
            ));
        }
        Ok(Self {
            users: source.subscribe(Collection::Users, Filter::All)?,
            services: source.subscribe(Collection::Services, Filter::All)?,
            latest_users: None,
            latest_services: None,
        })
    }

    pub async fn next(&mut self) -> Result<AdminQueues> {
        loop {
            match next_update(&mut self.users, &mut self.services).await? {
                Update::Primary(snap) => self.latest_users = Some(snap.decode_all()),
                Update::Secondary(snap) => self.latest_services = Some(snap.decode_all()),
            }
            if let (Some(users), Some(services)) = (&self.latest_users, &self.latest_services) {
                return Ok(project_admin_queues(users, services));
            }
        }
    }
}

/// Chat screen state: the thread and the counterparty's presence line.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub messages: Vec<Message>,
    pub presence: Option<String>,
}

/// Chat screen with one counterparty.
pub struct ThreadFeed {
    viewer: Viewer,
    counterparty: String,
    messages: Subscription,
    profile: Subscription,
    latest_messages: Option<Vec<Message>>,
    latest_profile: Option<Option<User>>,
}

impl ThreadFeed {
    pub fn open<S: RecordSource>(source: &S, viewer: Viewer, counterparty: &str) -> Result<Self> {
        let messages = source.subscribe(
            Collection::Messages,
            Filter::contains("participants", viewer.id.clone()),
        )?;
        let profile = source.subscribe(Collection::Users, Filter::id(counterparty))?;
        Ok(Self {
            viewer,
            counterparty: counterparty.to_string(),
            messages,
            profile,
            latest_messages: None,
            latest_profile: None,
        })
    }

    pub async fn next(&mut self) -> Result<ThreadView> {
        loop {
            match next_update(&mut self.messages, &mut self.profile).await? {
                Update::Primary(snap) => self.latest_messages = Some(snap.decode_all()),
                Update::Secondary(snap) => {
                    self.latest_profile = Some(snap.decode_all::<User>().into_iter().next())
                }
            }
            if let (Some(messages), Some(profile)) = (&self.latest_messages, &self.latest_profile)
            {
                return Ok(ThreadView {
                    messages: project_thread(messages, &self.viewer, &self.counterparty),
                    presence: presence_line(profile.as_ref()),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, RequestStatus, ServiceStatus};
    use crate::projection::ProfileSnapshot;
    use crate::source::{encode, MemoryStore};
    use crate::viewer::Role;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn t(min: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 8, 10, min, 0).unwrap()
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn booking_ab() -> Booking {
        Booking {
            id: String::new(),
            user_id: "A".into(),
            provider_id: "B".into(),
            participants: vec!["A".into(), "B".into()],
            service_id: "s1".into(),
            service_name: "Deep clean".into(),
            provider_name: "Bea".into(),
            status: BookingStatus::Pending,
            booking_date_time: t(30),
            created_at: t(0),
        }
    }

    async fn within<F: std::future::Future>(fut: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(1), fut)
            .await
            .expect("feed update")
    }

    #[tokio::test]
    async fn test_inbox_follows_messages_and_profiles() {
        let store = MemoryStore::new();
        store.insert(Collection::Users, "u2", &user("u2", "Bea")).unwrap();
        store
            .insert(Collection::Messages, "m1", &Message::new("u1", "u2", "hi", t(1)))
            .unwrap();

        let mut feed = InboxFeed::open(&store, Viewer::customer("u1")).unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].last_text, "hi");
        assert!(!inbox[0].profile.is_online);

        store
            .write(
                Collection::Messages,
                None,
                encode(&Message::new("u2", "u1", "yo", t(2))).unwrap(),
            )
            .await
            .unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert_eq!(inbox[0].last_text, "yo");

        let mut online = user("u2", "Bea");
        online.is_online = true;
        store.insert(Collection::Users, "u2", &online).unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert!(inbox[0].profile.is_online);
    }

    #[tokio::test]
    async fn test_dropping_feed_releases_subscriptions() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Messages, "m1", &Message::new("u1", "u2", "hi", t(1)))
            .unwrap();
        let mut feed = InboxFeed::open(&store, Viewer::customer("u1")).unwrap();
        let thread = ThreadFeed::open(&store, Viewer::customer("u1"), "u2").unwrap();
        within(feed.next()).await.unwrap();
        assert_eq!(store.listener_count(Collection::Messages), 2);
        assert_eq!(store.listener_count(Collection::Users), 2);

        drop(feed);
        drop(thread);
        assert_eq!(store.listener_count(Collection::Messages), 0);
        assert_eq!(store.listener_count(Collection::Users), 0);
    }

    #[tokio::test]
    async fn test_inbox_ignores_unrelated_profiles() {
        let store = MemoryStore::new();
        store.insert(Collection::Users, "u2", &user("u2", "Bea")).unwrap();
        store.insert(Collection::Users, "u9", &user("u9", "Zed")).unwrap();
        store
            .insert(Collection::Messages, "m1", &Message::new("u2", "u1", "hi", t(1)))
            .unwrap();

        let mut feed = InboxFeed::open(&store, Viewer::customer("u1")).unwrap();
        within(feed.next()).await.unwrap();
        // One profile subscription, for the only counterparty.
        assert_eq!(store.listener_count(Collection::Users), 1);

        let mut next = tokio_test::task::spawn(feed.next());
        tokio_test::assert_pending!(next.poll());
        store.insert(Collection::Users, "u9", &user("u9", "Zed Jr")).unwrap();
        tokio_test::assert_pending!(next.poll());

        store.insert(Collection::Users, "u2", &user("u2", "Bea B")).unwrap();
        assert!(next.is_woken());
        let inbox = tokio_test::assert_ready_ok!(next.poll());
        assert_eq!(inbox[0].profile.name, "Bea B");
    }

    #[tokio::test]
    async fn test_inbox_follows_new_counterparties() {
        let store = MemoryStore::new();
        store.insert(Collection::Users, "u3", &user("u3", "Cy")).unwrap();
        store
            .insert(Collection::Messages, "m1", &Message::new("u2", "u1", "hi", t(1)))
            .unwrap();

        let mut feed = InboxFeed::open(&store, Viewer::customer("u1")).unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert_eq!(inbox[0].profile, ProfileSnapshot::placeholder());

        store
            .insert(Collection::Messages, "m2", &Message::new("u3", "u1", "hey", t(2)))
            .unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].counterparty_id, "u3");
        assert_eq!(inbox[0].profile.name, "Cy");
        assert_eq!(store.listener_count(Collection::Users), 2);

        store
            .delete(Collection::Messages, "m1")
            .await
            .unwrap();
        let inbox = within(feed.next()).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(store.listener_count(Collection::Users), 1);
    }

    #[tokio::test]
    async fn test_booking_feed_updates_on_status_change() {
        let store = MemoryStore::new();
        let booking = booking_ab();
        store.insert(Collection::Bookings, "b1", &booking).unwrap();

        let mut feed = BookingFeed::open(&store, Viewer::customer("B")).unwrap();
        let view = within(feed.next()).await.unwrap();
        assert!(view.mine.is_empty());
        assert_eq!(view.incoming[0].actions.len(), 2);

        let mut fields = crate::source::Fields::new();
        fields.insert("status".into(), serde_json::json!("Confirmed"));
        store
            .write(Collection::Bookings, Some("b1"), fields)
            .await
            .unwrap();
        let view = within(feed.next()).await.unwrap();
        assert_eq!(view.incoming[0].booking.status, BookingStatus::Confirmed);
        assert_eq!(view.incoming[0].actions, vec![BookingStatus::Completed]);
    }

    #[tokio::test]
    async fn test_feed_waits_for_a_change() {
        let store = MemoryStore::new();
        let mut feed = BookingFeed::open(&store, Viewer::customer("A")).unwrap();
        assert!(within(feed.next()).await.unwrap().is_empty());

        let mut next = tokio_test::task::spawn(feed.next());
        tokio_test::assert_pending!(next.poll());

        store.insert(Collection::Bookings, "b1", &booking_ab()).unwrap();
        assert!(next.is_woken());
        let view = tokio_test::assert_ready_ok!(next.poll());
        assert_eq!(view.mine.len(), 1);
        assert!(view.incoming.is_empty());
    }

    #[tokio::test]
    async fn test_admin_feed_requires_admin() {
        let store = MemoryStore::new();
        let err = AdminFeed::open(&store, &Viewer::customer("u1")).err().unwrap();
        assert!(matches!(err, HiveError::Unauthorized(_)));
        assert_eq!(store.listener_count(Collection::Users), 0);
    }

    #[tokio::test]
    async fn test_admin_feed_drops_service_when_owner_demoted() {
        let store = MemoryStore::new();
        let mut owner = user("P", "Pat");
        owner.is_service_provider = true;
        owner.request_status = RequestStatus::Approved;
        store.insert(Collection::Users, "P", &owner).unwrap();
        store
            .insert(
                Collection::Services,
                "s1",
                &Service {
                    id: String::new(),
                    user_id: "P".into(),
                    service_name: "Windows".into(),
                    category: "Cleaning".into(),
                    description: String::new(),
                    price_range: String::new(),
                    availability: String::new(),
                    status: ServiceStatus::Approved,
                    provider_name: None,
                    created_at: None,
                },
            )
            .unwrap();

        let admin = Viewer::new("root", Role::Admin);
        let mut feed = AdminFeed::open(&store, &admin).unwrap();
        let queues = within(feed.next()).await.unwrap();
        assert_eq!(queues.available_services.len(), 1);

        owner.request_status = RequestStatus::Pending;
        store.insert(Collection::Users, "P", &owner).unwrap();
        let queues = within(feed.next()).await.unwrap();
        assert!(queues.available_services.is_empty());
    }

    #[tokio::test]
    async fn test_thread_feed_presence() {
        let store = MemoryStore::new();
        let mut bea = user("u2", "Bea");
        bea.is_online = true;
        store.insert(Collection::Users, "u2", &bea).unwrap();
        store
            .insert(Collection::Messages, "m1", &Message::new("u2", "u1", "hello", t(1)))
            .unwrap();
        store
            .insert(Collection::Messages, "m2", &Message::new("u3", "u1", "elsewhere", t(2)))
            .unwrap();

        let mut feed = ThreadFeed::open(&store, Viewer::customer("u1"), "u2").unwrap();
        let view = within(feed.next()).await.unwrap();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.presence.as_deref(), Some("Online"));
    }
}
