//! HelperHive CLI - home-service marketplace client
//!
//! Drives the HelperHive projections and actions against a local record
//! store snapshot.

mod commands;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helperhive::api::{self, Confirmation, HiveClient, ProfileForm, ServiceForm};
use helperhive::auth::{self, Identity};
use helperhive::config::Config;
use helperhive::models::{BookingStatus, ServiceStatus};
use helperhive::source::MemoryStore;

#[derive(Parser)]
#[command(name = "helperhive")]
#[command(about = "CLI client for the HelperHive service marketplace", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Record store snapshot (defaults to the configured data file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Act as this user id instead of the signed-in identity
    #[arg(long = "as", global = true)]
    as_user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the account record for a newly registered identity
    Signup {
        #[arg(long)]
        uid: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Store the identity returned by the auth service
    Login {
        #[arg(long)]
        uid: String,

        #[arg(long)]
        email: String,

        /// The account's email has not been verified yet
        #[arg(long)]
        unverified: bool,

        /// Replace a stored identity even if it is still valid
        #[arg(short, long)]
        force: bool,
    },

    /// Forget the signed-in identity
    Logout,

    /// Show current authentication status
    Status,

    /// Show the signed-in user's profile and role
    Whoami,

    /// List conversations, newest first
    Inbox {
        /// Maximum number of conversations to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the message thread with another user
    Chat {
        /// Counterparty user id
        with: String,
    },

    /// Send a message
    Send {
        /// Recipient user id
        #[arg(short, long)]
        to: String,

        /// Message text
        message: String,
    },

    /// Follow the inbox live until Ctrl+C
    WatchInbox,

    /// List your bookings and incoming requests
    Bookings,

    /// Book a service
    Book {
        service_id: String,

        /// Requested time (RFC 3339, e.g. 2025-01-15T09:30:00Z)
        #[arg(long)]
        at: DateTime<Utc>,
    },

    /// Confirm, reject, cancel or complete a booking
    Booking {
        booking_id: String,

        action: BookingAction,

        /// Confirm a cancel or reject
        #[arg(short, long)]
        yes: bool,
    },

    /// Browse services of approved providers
    Catalog {
        /// Category to search for
        category: Option<String>,
    },

    /// Show reviews of a service
    Reviews { service_id: String },

    /// Review a service
    Review {
        service_id: String,

        /// Stars, 1 to 5
        #[arg(short, long)]
        rating: u8,

        text: String,
    },

    /// Offer a new service
    RegisterService {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        availability: String,
    },

    /// Submit your profile to become a service provider
    CompleteProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        date_of_birth: String,
        #[arg(long)]
        experience: String,
        #[arg(long)]
        id_number: String,
    },

    /// Set your presence
    Presence {
        #[arg(value_parser = ["online", "offline"])]
        state: String,
    },

    /// Show the admin approval queues
    Admin,

    /// Approve a provider request
    Approve { user_id: String },

    /// Reject a provider request and delete the user
    RejectUser {
        user_id: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// Fill an empty store with demo records
    Seed {
        /// Seed even if the store already has records
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BookingAction {
    Confirm,
    Reject,
    Cancel,
    Complete,
}

impl BookingAction {
    fn target(self) -> BookingStatus {
        match self {
            BookingAction::Confirm => BookingStatus::Confirmed,
            BookingAction::Reject => BookingStatus::Rejected,
            BookingAction::Cancel => BookingStatus::Canceled,
            BookingAction::Complete => BookingStatus::Completed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::load()?;
    let data_path = match cli.data {
        Some(path) => path,
        None => config.data_path()?,
    };

    // Commands that only touch the local config or the raw store.
    match cli.command {
        Commands::Signup { uid, name, email } => {
            let store = MemoryStore::open(&data_path)?;
            let user = api::sign_up(&store, &uid, &name, &email).await?;
            store.save(&data_path)?;
            println!(
                "Account created for {}. Verify your email, then run 'helperhive login'.",
                user.email
            );
            return Ok(());
        }
        Commands::Login {
            uid,
            email,
            unverified,
            force,
        } => {
            let identity = Identity::new(uid, email, !unverified);
            let outcome = auth::login(&mut config, identity.clone(), force)?;
            config.save()?;

            let store = MemoryStore::open(&data_path)?;
            if api::mark_verified(&store, &identity).await? {
                store.save(&data_path)?;
            }
            commands::print_login(outcome, &config);
            return Ok(());
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(&mut config);
            config.save()?;
            println!("Logged out.");
            return Ok(());
        }
        Commands::Status => {
            commands::print_status(&config, &data_path);
            return Ok(());
        }
        Commands::Seed { force } => {
            let store = MemoryStore::open(&data_path)?;
            commands::seed(&store, force)?;
            store.save(&data_path)?;
            return Ok(());
        }
        _ => {}
    }

    let uid = match cli.as_user {
        Some(uid) => uid,
        None => auth::signed_in(&config)?.uid,
    };
    let store = MemoryStore::open(&data_path)?;
    let client = HiveClient::connect(store.clone(), &uid).await?;

    let mutated = match cli.command {
        Commands::Whoami => {
            commands::whoami(&client).await?;
            false
        }
        Commands::Inbox { limit } => {
            commands::inbox(&client, limit.unwrap_or_else(|| config.inbox_limit())).await?;
            false
        }
        Commands::Chat { with } => {
            commands::chat(&client, &with).await?;
            false
        }
        Commands::Send { to, message } => {
            tracing::info!("Sending message...");
            client.send_message(&to, &message).await?;
            println!("Message sent.");
            true
        }
        Commands::WatchInbox => {
            commands::watch_inbox(&client, config.inbox_limit()).await?;
            false
        }
        Commands::Bookings => {
            commands::bookings(&client).await?;
            false
        }
        Commands::Book { service_id, at } => {
            let booking = client.place_booking(&service_id, at).await?;
            println!(
                "Booked {} with {} ({}), status {}.",
                booking.service_name, booking.provider_name, booking.id, booking.status
            );
            true
        }
        Commands::Booking {
            booking_id,
            action,
            yes,
        } => {
            let booking = client
                .transition_booking(&booking_id, action.target(), Confirmation::from_flag(yes))
                .await
                .with_context(|| format!("Could not update booking {}", booking_id))?;
            println!("Booking {} is now {}.", booking.id, booking.status);
            true
        }
        Commands::Catalog { category } => {
            commands::catalog(&client, category.as_deref().unwrap_or("")).await?;
            false
        }
        Commands::Reviews { service_id } => {
            commands::reviews(&client, &service_id).await?;
            false
        }
        Commands::Review {
            service_id,
            rating,
            text,
        } => {
            client.submit_review(&service_id, rating, &text).await?;
            println!("Thanks for your review.");
            true
        }
        Commands::RegisterService {
            name,
            category,
            description,
            price,
            availability,
        } => {
            let form = ServiceForm {
                service_name: name,
                category,
                description,
                price_range: price,
                availability,
            };
            let service = client.register_service(&form).await?;
            println!("Service {} registered ({}).", service.service_name, service.id);
            if service.status == ServiceStatus::Pending {
                println!("It will be listed once an admin approves you as a provider.");
            }
            true
        }
        Commands::CompleteProfile {
            name,
            last_name,
            email,
            phone,
            address,
            city,
            country,
            date_of_birth,
            experience,
            id_number,
        } => {
            let form = ProfileForm {
                name,
                last_name,
                email,
                phone,
                address,
                city,
                country,
                date_of_birth,
                experience,
                id_number,
                profile_image: None,
            };
            client.complete_profile(&form).await?;
            println!("Profile submitted. An admin will review your request.");
            true
        }
        Commands::Presence { state } => {
            client.set_presence(state == "online").await?;
            println!("Presence set to {}.", state);
            true
        }
        Commands::Admin => {
            commands::admin(&client).await?;
            false
        }
        Commands::Approve { user_id } => {
            let user = client.approve_provider(&user_id).await?;
            println!("{} is now an approved provider.", user.name);
            true
        }
        Commands::RejectUser { user_id, yes } => {
            client
                .reject_provider(&user_id, Confirmation::from_flag(yes))
                .await
                .context("Pass --yes to confirm the deletion")?;
            println!("User {} rejected and removed.", user_id);
            true
        }
        // Handled before connecting.
        Commands::Signup { .. }
        | Commands::Login { .. }
        | Commands::Logout
        | Commands::Status
        | Commands::Seed { .. } => false,
    };

    if mutated {
        store.save(&data_path)?;
    }
    Ok(())
}
