use std::{collections::HashMap, error::Error as StdError};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};
use uuid::Uuid;

use super::{user, Client};

#[derive(Clone, Debug)]
pub struct Event {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub city: String,
    pub location: String,
    pub category: String,
    pub start_at: OffsetDateTime,
    pub end_at: Option<OffsetDateTime>,
    pub image_url: Option<String>,
    pub organizer: user::Id,
    pub created_at: OffsetDateTime,
}

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
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

fn from_row(row: &Row) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        city: row.get("city"),
        location: row.get("location"),
        category: row.get("category"),
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
        image_url: row.get("image_url"),
        organizer: row.get("organizer_id"),
        created_at: row.get("created_at"),
    }
}

impl Client {
    pub async fn get_event_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Event>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, city, location, category, \
                   start_at, end_at, image_url, organizer_id, created_at \
            FROM events \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    pub async fn get_events(&self) -> Result<Vec<Event>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, city, location, category, \
                   start_at, end_at, image_url, organizer_id, created_at \
            FROM events \
            ORDER BY start_at ASC, \
                     id ASC";
        Ok(self.0.query(SQL, &[]).await?.iter().map(from_row).collect())
    }

    pub async fn get_events_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, Event>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, city, location, category, \
                   start_at, end_at, image_url, organizer_id, created_at \
            FROM events \
            WHERE id IN (SELECT unnest($1::UUID[])) \
            LIMIT $2";

        let limit = i64::try_from(ids.len()).unwrap();

        Ok(self
            .0
            .query(SQL, &[&ids, &limit])
            .await?
            .iter()
            .map(|row| {
                let event = from_row(row);
                (event.id, event)
            })
            .collect())
    }

    /// Events starting within `[from, to)`, ascending by start time.
    pub async fn get_events_in_range(
        &self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Event>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, city, location, category, \
                   start_at, end_at, image_url, organizer_id, created_at \
            FROM events \
            WHERE start_at >= $1 \
              AND start_at < $2 \
            ORDER BY start_at ASC, \
                     id ASC";
        Ok(self
            .0
            .query(SQL, &[&from, &to])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }

    pub async fn write_event(&self, event: &Event) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO events (id, title, description, city, location, \
                                category, start_at, end_at, image_url, \
                                organizer_id, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
            ON CONFLICT (id) DO UPDATE \
            SET title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                city = EXCLUDED.city, \
                location = EXCLUDED.location, \
                category = EXCLUDED.category, \
                start_at = EXCLUDED.start_at, \
                end_at = EXCLUDED.end_at, \
                image_url = EXCLUDED.image_url, \
                organizer_id = EXCLUDED.organizer_id, \
                created_at = EXCLUDED.created_at";

        self.0
            .execute(
                SQL,
                &[
                    &event.id,
                    &event.title,
                    &event.description,
                    &event.city,
                    &event.location,
                    &event.category,
                    &event.start_at,
                    &event.end_at,
                    &event.image_url,
                    &event.organizer,
                    &event.created_at,
                ],
            )
            .await
            .map(drop)
    }

    /// Deletes the event together with its reviews and ticket types in one
    /// atomic statement. Returns `false` when no such event exists. Fails
    /// with a foreign key violation while order items still reference any
    /// of the event's ticket types.
    pub async fn delete_event(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "\
            WITH deleted_reviews AS (\
                DELETE FROM reviews WHERE event_id = $1\
            ), \
            deleted_ticket_types AS (\
                DELETE FROM ticket_types WHERE event_id = $1\
            ) \
            DELETE FROM events WHERE id = $1";

        self.0.execute(SQL, &[&id]).await.map(|deleted| deleted > 0)
    }
}
