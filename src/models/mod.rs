//! Data models for HelperHive records

mod booking;
mod message;
mod review;
mod service;
mod user;

pub use booking::*;
pub use message::*;
pub use review::*;
pub use service::*;
pub use user::*;
