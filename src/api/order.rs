use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api;

pub use crate::db::order::{Id, Status};

/// Confirmation returned by a successful reservation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub order_id: Id,
    /// `unit_price * quantity`, in minor currency units.
    pub total_price: i64,
    pub event_id: api::event::Id,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Id,
    pub status: Status,
    pub total_price: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub event_id: api::event::Id,
    pub event_title: String,
    pub ticket_type_id: api::ticket_type::Id,
    pub ticket_type_name: String,
    pub quantity: usize,
    /// Unit price captured at reservation time.
    pub unit_price: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub orders: Vec<Order>,
    pub total_count: usize,
}
