use std::{collections::HashMap, error::Error as StdError};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error,
};
use uuid::Uuid;

use super::{event, user, Client};

/// One review of an event. The store holds at most one review per
/// `(event, user)` pair; a second insert fails with a unique violation.
#[derive(Clone, Debug)]
pub struct Review {
    pub id: Id,
    pub event: event::Id,
    pub user: user::Id,
    pub rating: u8,
    pub text: String,
    pub created_at: OffsetDateTime,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl FromSql<'_> for Id {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for Id {
    accepts!(UUID);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

impl Client {
    pub async fn write_review(&self, review: &Review) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO reviews (id, event_id, user_id, rating, text, \
                                 created_at) \
            VALUES ($1, $2, $3, $4, $5, $6)";

        self.0
            .execute(
                SQL,
                &[
                    &review.id,
                    &review.event,
                    &review.user,
                    &i16::from(review.rating),
                    &review.text,
                    &review.created_at,
                ],
            )
            .await
            .map(drop)
    }

    pub async fn get_reviews_by_event(
        &self,
        event: event::Id,
    ) -> Result<Vec<Review>, Error> {
        const SQL: &str = "\
            SELECT id, event_id, user_id, rating, text, created_at \
            FROM reviews \
            WHERE event_id = $1 \
            ORDER BY created_at DESC, \
                     id DESC";
        Ok(self
            .0
            .query(SQL, &[&event])
            .await?
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                event: row.get("event_id"),
                user: row.get("user_id"),
                rating: u8::try_from(row.get::<_, i16>("rating")).unwrap(),
                text: row.get("text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Average rating per event. Events without reviews are absent from
    /// the result.
    pub async fn get_avg_ratings_by_events(
        &self,
        event_ids: &[event::Id],
    ) -> Result<HashMap<event::Id, f64>, Error> {
        const SQL: &str = "\
            SELECT event_id, AVG(rating)::FLOAT8 AS avg_rating \
            FROM reviews \
            WHERE event_id IN (SELECT unnest($1::UUID[])) \
            GROUP BY event_id";
        Ok(self
            .0
            .query(SQL, &[&event_ids])
            .await?
            .into_iter()
            .map(|row| (row.get("event_id"), row.get("avg_rating")))
            .collect())
    }
}
