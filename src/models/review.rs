//! Review-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest and highest star rating accepted for a review.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Customer review of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: String,
    pub service_id: String,
    pub user_id: String,
    pub rating: u8,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
