//! CLI output for each command

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::Path;
use std::time::Duration;
use tokio::time;

use helperhive::api::HiveClient;
use helperhive::auth::{signed_in, LoginOutcome};
use helperhive::config::Config;
use helperhive::models::{
    Booking, BookingStatus, Message, RequestStatus, Review, Service, ServiceStatus, User,
};
use helperhive::projection::{BookingItem, Conversation};
use helperhive::source::{get_as, Collection, MemoryStore};

pub fn print_login(outcome: LoginOutcome, config: &Config) {
    let email = config
        .identity
        .as_ref()
        .map(|i| i.email.as_str())
        .unwrap_or("?");
    match outcome {
        LoginOutcome::SignedIn => println!("Signed in as {}.", email),
        LoginOutcome::AlreadySignedIn => {
            println!("Already signed in as {}. Use --force to replace.", email)
        }
    }
}

pub fn print_status(config: &Config, data_path: &Path) {
    match signed_in(config) {
        Ok(identity) => println!("Identity:   {} ({})", identity.email, identity.uid),
        Err(e) => println!("Identity:   none ({})", e.user_message()),
    }
    println!("Data file:  {}", data_path.display());
    println!("Inbox size: {}", config.inbox_limit());
}

pub async fn whoami(client: &HiveClient<MemoryStore>) -> Result<()> {
    let viewer = client.viewer();
    let user: Option<User> = get_as(client.source(), Collection::Users, &viewer.id).await?;

    println!("\nUser Info:");
    println!("  Id:   {}", viewer.id);
    println!("  Role: {}", viewer.role.as_str());
    if let Some(user) = user {
        println!("  Name:  {}", user.name);
        println!("  Email: {}", user.email);
        if !user.is_verified {
            println!("  Email not verified yet");
        }
        if user.request_status != RequestStatus::None {
            println!("  Provider request: {:?}", user.request_status);
        }
    } else {
        println!("  (no profile yet)");
    }
    Ok(())
}

fn print_conversations(conversations: &[Conversation], limit: usize) {
    if conversations.is_empty() {
        println!("No conversations yet.");
        return;
    }
    for conv in conversations.iter().take(limit) {
        let status = if conv.profile.is_online { "*" } else { " " };
        println!(
            "{} {:<20} {}  {}",
            status,
            conv.profile.name,
            conv.last_timestamp.format("%Y-%m-%d %H:%M"),
            conv.last_text
        );
        println!("  id: {}", conv.counterparty_id);
    }
}

pub async fn inbox(client: &HiveClient<MemoryStore>, limit: usize) -> Result<()> {
    let conversations = client.inbox().await?;
    println!("\nInbox:");
    print_conversations(&conversations, limit);
    Ok(())
}

pub async fn chat(client: &HiveClient<MemoryStore>, with: &str) -> Result<()> {
    let view = client.thread(with).await?;
    let name: String = get_as::<_, User>(client.source(), Collection::Users, with)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "User".to_string());

    println!("\n{}", name);
    if let Some(presence) = view.presence {
        println!("{}", presence);
    }
    println!();
    for msg in &view.messages {
        let who = if msg.sender_id == client.viewer().id {
            "You"
        } else {
            name.as_str()
        };
        println!("[{}] {}: {}", msg.timestamp.format("%H:%M"), who, msg.text);
    }
    if view.messages.is_empty() {
        println!("No messages yet.");
    }
    Ok(())
}

/// Print the inbox on every change until Ctrl+C.
///
/// A dropped subscription is reopened with exponential backoff (1s, 2s, 4s,
/// ... capped at 32s).
pub async fn watch_inbox(client: &HiveClient<MemoryStore>, limit: usize) -> Result<()> {
    let mut backoff = 1u64;
    loop {
        let mut feed = client.inbox_feed()?;
        loop {
            tokio::select! {
                update = feed.next() => match update {
                    Ok(conversations) => {
                        backoff = 1;
                        println!("\nInbox ({}):", Utc::now().format("%H:%M:%S"));
                        print_conversations(&conversations, limit);
                    }
                    Err(e) if e.is_retryable() => {
                        tracing::warn!("Inbox feed lost: {}. Reopening in {}s...", e, backoff);
                        break;
                    }
                    Err(e) => return Err(e).context("Inbox feed failed"),
                },
                _ = tokio::signal::ctrl_c() => {
                    println!("Shutting down...");
                    return Ok(());
                }
            }
        }
        drop(feed);

        tokio::select! {
            _ = time::sleep(Duration::from_secs(backoff)) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down...");
                return Ok(());
            }
        }
        backoff = (backoff * 2).min(32);
    }
}

fn print_booking(item: &BookingItem) {
    let b = &item.booking;
    println!(
        "  {} {:<20} {:<10} {}",
        b.booking_date_time.format("%Y-%m-%d %H:%M"),
        b.service_name,
        b.status,
        b.id
    );
    if !item.actions.is_empty() {
        let actions: Vec<&str> = item.actions.iter().map(|a| a.as_str()).collect();
        println!("    can move to: {}", actions.join(", "));
    }
}

pub async fn bookings(client: &HiveClient<MemoryStore>) -> Result<()> {
    let view = client.bookings().await?;
    if view.is_empty() {
        println!("No bookings.");
        return Ok(());
    }
    println!("\nYour bookings:");
    view.mine.iter().for_each(print_booking);
    println!("\nIncoming requests:");
    view.incoming.iter().for_each(print_booking);
    if !view.unassigned.is_empty() {
        println!("\nOther bookings you appear on (read-only):");
        for b in &view.unassigned {
            println!(
                "  {} {:<20} {:<10} {}",
                b.booking_date_time.format("%Y-%m-%d %H:%M"),
                b.service_name,
                b.status,
                b.id
            );
        }
    }
    Ok(())
}

pub async fn catalog(client: &HiveClient<MemoryStore>, category: &str) -> Result<()> {
    let services = client.catalog(category).await?;
    if services.is_empty() {
        println!("No services found.");
        return Ok(());
    }
    for s in &services {
        println!(
            "{:<24} {:<12} {:<10} by {}",
            s.service_name,
            s.category,
            s.price_range,
            s.provider_name.as_deref().unwrap_or("Unknown")
        );
        println!("  id: {}  available: {}", s.id, s.availability);
    }
    Ok(())
}

pub async fn reviews(client: &HiveClient<MemoryStore>, service_id: &str) -> Result<()> {
    let summary = client.reviews(service_id).await?;
    match summary.average {
        Some(avg) => println!("\n{:.1} stars from {} reviews", avg, summary.count),
        None => println!("\nNo reviews yet."),
    }
    for r in &summary.reviews {
        println!("  {} {}  {}", "*".repeat(r.rating as usize), r.timestamp.format("%Y-%m-%d"), r.text);
    }
    Ok(())
}

pub async fn admin(client: &HiveClient<MemoryStore>) -> Result<()> {
    let queues = client.admin_queues().await?;

    println!("\nPending provider requests ({}):", queues.pending_users.len());
    for u in &queues.pending_users {
        println!("  {:<20} {:<28} {}", u.name, u.email, u.id);
    }
    println!("\nProviders ({}):", queues.providers.len());
    for u in &queues.providers {
        println!("  {:<20} {:?}", u.name, u.request_status);
    }
    println!("\nPending services ({}):", queues.pending_services.len());
    for s in &queues.pending_services {
        println!("  {:<24} owner {}", s.service_name, s.user_id);
    }
    println!("\nAvailable services ({}):", queues.available_services.len());
    for s in &queues.available_services {
        println!("  {:<24} owner {}", s.service_name, s.user_id);
    }
    Ok(())
}

/// Fill the store with a small demo marketplace.
pub fn seed(store: &MemoryStore, force: bool) -> Result<()> {
    if !store.is_empty() && !force {
        println!("Store already has records. Use --force to seed anyway.");
        return Ok(());
    }
    let now = Utc::now();

    let users = [
        ("admin", "Hive Admin", "admin@helperhive.app", true, false, RequestStatus::None),
        ("bea", "Bea Plumb", "bea@example.com", false, true, RequestStatus::Approved),
        ("ann", "Ann Home", "ann@example.com", false, false, RequestStatus::None),
        ("pat", "Pat Paint", "pat@example.com", false, false, RequestStatus::Pending),
    ];
    for (id, name, email, is_admin, is_service_provider, request_status) in users {
        let user = User {
            name: name.to_string(),
            email: email.to_string(),
            is_admin,
            is_service_provider,
            request_status,
            last_seen: Some(now - ChronoDuration::minutes(30)),
            is_verified: true,
            created_at: Some(now - ChronoDuration::days(30)),
            ..Default::default()
        };
        store.insert(Collection::Users, id, &user)?;
    }

    let services = [
        ("svc-leak", "bea", "Leak repair", "Plumbing", "40-120", ServiceStatus::Approved),
        ("svc-drain", "bea", "Drain unblocking", "Plumbing", "60-90", ServiceStatus::Approved),
        ("svc-paint", "pat", "Room painting", "Painting", "150-400", ServiceStatus::Pending),
    ];
    for (id, owner, name, category, price, status) in services {
        let service = Service {
            id: String::new(),
            user_id: owner.to_string(),
            service_name: name.to_string(),
            category: category.to_string(),
            description: format!("{} by a local professional", name),
            price_range: price.to_string(),
            availability: "Mon-Fri 8:00-18:00".to_string(),
            status,
            provider_name: None,
            created_at: Some(now - ChronoDuration::days(7)),
        };
        store.insert(Collection::Services, id, &service)?;
    }

    let messages = [
        ("msg-1", "ann", "bea", "Hi, are you free on Friday?", 20),
        ("msg-2", "bea", "ann", "Yes, morning works.", 15),
    ];
    for (id, from, to, text, mins_ago) in messages {
        let msg = Message::new(from, to, text, now - ChronoDuration::minutes(mins_ago));
        store.insert(Collection::Messages, id, &msg)?;
    }

    let booking = Booking {
        id: String::new(),
        user_id: "ann".to_string(),
        provider_id: "bea".to_string(),
        participants: vec!["ann".to_string(), "bea".to_string()],
        service_id: "svc-leak".to_string(),
        service_name: "Leak repair".to_string(),
        provider_name: "Bea Plumb".to_string(),
        status: BookingStatus::Pending,
        booking_date_time: now + ChronoDuration::days(2),
        created_at: now - ChronoDuration::minutes(10),
    };
    store.insert(Collection::Bookings, "bk-1", &booking)?;

    let review = Review {
        id: String::new(),
        service_id: "svc-drain".to_string(),
        user_id: "ann".to_string(),
        rating: 5,
        text: "Fast and friendly.".to_string(),
        timestamp: now - ChronoDuration::days(3),
    };
    store.insert(Collection::Reviews, "rev-1", &review)?;

    tracing::info!("Seeded demo records");
    println!("Seeded demo data. Try: helperhive --as ann inbox");
    Ok(())
}
