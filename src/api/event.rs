use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api;

pub use crate::db::event::Id;

/// Catalog listing entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub city: String,
    pub location: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_at: Option<OffsetDateTime>,
    pub image_url: Option<String>,
    /// Average review rating rounded to 2 decimals, 0 when unreviewed.
    pub avg_rating: f64,
    pub ticket_types: Vec<api::TicketType>,
}

/// Event page payload: the listing entry plus organizer and reviews.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub city: String,
    pub location: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_at: Option<OffsetDateTime>,
    pub image_url: Option<String>,
    pub avg_rating: f64,
    pub ticket_types: Vec<api::TicketType>,
    pub organizer: api::User,
    pub reviews: Vec<api::Review>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub events: Vec<Event>,
    pub total_count: usize,
}
