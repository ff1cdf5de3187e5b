//! Cart items: a student's pending-purchase selections.

use super::{RecordId, course::Course};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub class_id: RecordId,
    pub user_email: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Body of `POST /carts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub class_id: RecordId,
    pub user_email: String,
    pub submitted_at: DateTime<Utc>,
}

impl NewCartItem {
    pub fn new(class_id: &str, user_email: &str) -> Self {
        Self {
            class_id: class_id.to_string(),
            user_email: user_email.to_string(),
            submitted_at: Utc::now(),
        }
    }
}

/// A cart item joined with its class. The class may have been deleted since
/// it was selected, in which case it contributes nothing to the total.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub item: CartItem,
    pub course: Option<Course>,
}

impl CartEntry {
    pub fn price(&self) -> f64 {
        self.course.as_ref().map_or(0.0, |c| c.price)
    }

    pub fn title(&self) -> &str {
        self.course
            .as_ref()
            .map_or("(class no longer available)", |c| c.name.as_str())
    }
}

/// Sum of entry prices, rounded to cents.
pub fn cart_total(entries: &[CartEntry]) -> f64 {
    let cents: f64 = entries.iter().map(|e| (e.price() * 100.0).round()).sum();
    cents / 100.0
}
