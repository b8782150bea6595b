//! Reviews shown on a service's detail page

use serde::Serialize;

use crate::models::Review;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewSummary {
    /// Newest first
    pub reviews: Vec<Review>,
    pub count: usize,
    /// Mean rating, `None` when there are no reviews
    pub average: Option<f32>,
}

pub fn project_reviews(reviews: &[Review], service_id: &str) -> ReviewSummary {
    let mut matching: Vec<Review> = reviews
        .iter()
        .filter(|r| r.service_id == service_id)
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let count = matching.len();
    let average = if count == 0 {
        None
    } else {
        let total: u32 = matching.iter().map(|r| u32::from(r.rating)).sum();
        Some(total as f32 / count as f32)
    };

    ReviewSummary {
        reviews: matching,
        count,
        average,
    }
}
