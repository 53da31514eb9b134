use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::api;

pub use crate::db::review::Id;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Id,
    pub rating: u8,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user: api::User,
}
