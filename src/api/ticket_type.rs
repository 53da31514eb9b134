use serde::{Deserialize, Serialize};

pub use crate::db::ticket_type::Id;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    pub id: Id,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub total: usize,
    pub sold: usize,
}
