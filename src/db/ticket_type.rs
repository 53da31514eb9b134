use std::{collections::HashMap, error::Error as StdError};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};
use uuid::Uuid;

use super::{event, Client};

/// A purchasable category of admission for an event with a fixed total
/// quantity. After creation `sold` changes only through
/// [`Client::reserve`](super::Client::reserve), which never decreases it.
#[derive(Clone, Debug)]
pub struct TicketType {
    pub id: Id,
    pub event: event::Id,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    pub total: usize,
    pub sold: usize,
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

fn from_row(row: &Row) -> TicketType {
    TicketType {
        id: row.get("id"),
        event: row.get("event_id"),
        name: row.get("name"),
        price: row.get("price"),
        total: usize::try_from(row.get::<_, i32>("total")).unwrap(),
        sold: usize::try_from(row.get::<_, i32>("sold")).unwrap(),
    }
}

impl Client {
    pub async fn get_ticket_type_by_id(
        &self,
        id: Id,
    ) -> Result<Option<TicketType>, Error> {
        const SQL: &str = "\
            SELECT id, event_id, name, price, total, sold \
            FROM ticket_types \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    pub async fn get_ticket_types_by_events(
        &self,
        event_ids: &[event::Id],
    ) -> Result<Vec<TicketType>, Error> {
        const SQL: &str = "\
            SELECT id, event_id, name, price, total, sold \
            FROM ticket_types \
            WHERE event_id IN (SELECT unnest($1::UUID[])) \
            ORDER BY name ASC, \
                     id ASC";
        Ok(self
            .0
            .query(SQL, &[&event_ids])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }

    pub async fn get_ticket_types_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, TicketType>, Error> {
        const SQL: &str = "\
            SELECT id, event_id, name, price, total, sold \
            FROM ticket_types \
            WHERE id IN (SELECT unnest($1::UUID[])) \
            LIMIT $2";

        let limit = i64::try_from(ids.len()).unwrap();

        Ok(self
            .0
            .query(SQL, &[&ids, &limit])
            .await?
            .iter()
            .map(|row| {
                let ticket_type = from_row(row);
                (ticket_type.id, ticket_type)
            })
            .collect())
    }

    pub async fn write_ticket_type(
        &self,
        ticket_type: &TicketType,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO ticket_types (id, event_id, name, price, total, \
                                      sold) \
            VALUES ($1, $2, $3, $4, $5, $6) \
            ON CONFLICT (id) DO UPDATE \
            SET event_id = EXCLUDED.event_id, \
                name = EXCLUDED.name, \
                price = EXCLUDED.price, \
                total = EXCLUDED.total, \
                sold = EXCLUDED.sold";

        self.0
            .execute(
                SQL,
                &[
                    &ticket_type.id,
                    &ticket_type.event,
                    &ticket_type.name,
                    &ticket_type.price,
                    &(ticket_type.total as i32),
                    &(ticket_type.sold as i32),
                ],
            )
            .await
            .map(drop)
    }
}
