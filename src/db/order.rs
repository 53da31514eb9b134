use std::error::Error as StdError;

use derive_more::Display;
use enum_utils::TryFromRepr;
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

use super::{event, ticket_type, user, Client};

#[derive(Clone, Debug)]
pub struct Order {
    pub id: Id,
    pub user: user::Id,
    pub status: Status,
    /// Total price in minor currency units.
    pub total_price: i64,
    pub created_at: OffsetDateTime,
}

/// A line of an order. `unit_price` is the ticket type's price captured at
/// reservation time, so later price edits leave past orders untouched.
#[derive(Clone, Debug)]
pub struct OrderItem {
    pub id: ItemId,
    pub order: Id,
    pub ticket_type: ticket_type::Id,
    pub quantity: usize,
    pub unit_price: i64,
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

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromSql<'_> for ItemId {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for ItemId {
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

#[derive(
    Clone, Copy, Debug, Deserialize, TryFromRepr, PartialEq, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Status {
    /// Order is created and paid for. Orders are never modified after
    /// creation; no cancellation or refund path exists.
    Created = 1,
}

impl FromSql<'_> for Status {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let status = Self::try_from(repr).map_err(|_| "invalid status")?;
        Ok(status)
    }
}

impl ToSql for Status {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

/// Outcome of [`Client::reserve`]. The two failure variants are expected,
/// reported results rather than errors, and both guarantee that nothing
/// was written.
#[derive(Clone, Copy, Debug)]
pub enum Reservation {
    Reserved {
        order: Id,
        /// `unit_price * quantity`, in minor currency units.
        total_price: i64,
        event: event::Id,
    },
    TicketTypeNotFound,
    InsufficientInventory,
}

impl Client {
    /// Converts available inventory of a ticket type into an order.
    ///
    /// The inventory check, the `sold` increment and the order/item
    /// inserts run as a single statement, so the store applies either all
    /// of them or none. The conditional `UPDATE` locks the ticket type row
    /// and re-evaluates `sold + quantity <= total` after concurrent
    /// writers commit, which keeps `sold <= total` even when overlapping
    /// reservations race for the last seats.
    pub async fn reserve(
        &self,
        ticket_type: ticket_type::Id,
        quantity: usize,
        purchaser: user::Id,
    ) -> Result<Reservation, Error> {
        const SQL: &str = "\
            WITH ticket_type AS (\
                UPDATE ticket_types \
                SET sold = sold + $2 \
                WHERE id = $1 \
                  AND sold + $2 <= total \
                RETURNING id, event_id, price\
            ), \
            new_order AS (\
                INSERT INTO orders (id, user_id, status, total_price, \
                                    created_at) \
                SELECT $3::UUID, $4::UUID, $5::INT2, price * $2, \
                       $6::TIMESTAMPTZ \
                FROM ticket_type \
                RETURNING id, total_price\
            ), \
            new_item AS (\
                INSERT INTO order_items (id, order_id, ticket_type_id, \
                                         quantity, unit_price) \
                SELECT $7::UUID, new_order.id, ticket_type.id, $2, \
                       ticket_type.price \
                FROM new_order, ticket_type\
            ) \
            SELECT new_order.id AS order_id, \
                   new_order.total_price, \
                   ticket_type.event_id \
            FROM new_order, ticket_type";

        let reserved = self
            .0
            .query_opt(
                SQL,
                &[
                    &ticket_type,
                    &(quantity as i32),
                    &Id::new(),
                    &purchaser,
                    &Status::Created,
                    &OffsetDateTime::now_utc(),
                    &ItemId::new(),
                ],
            )
            .await?;

        match reserved {
            Some(row) => Ok(Reservation::Reserved {
                order: row.get("order_id"),
                total_price: row.get("total_price"),
                event: row.get("event_id"),
            }),
            // A miss wrote nothing, so probing the ticket type afterwards
            // is safe: it only picks which failure to report.
            None => match self.get_ticket_type_by_id(ticket_type).await? {
                Some(_) => Ok(Reservation::InsufficientInventory),
                None => Ok(Reservation::TicketTypeNotFound),
            },
        }
    }

    pub async fn get_orders_by_user(
        &self,
        user: user::Id,
    ) -> Result<Vec<Order>, Error> {
        const SQL: &str = "\
            SELECT id, user_id, status, total_price, created_at \
            FROM orders \
            WHERE user_id = $1 \
            ORDER BY created_at DESC, \
                     id DESC";
        Ok(self
            .0
            .query(SQL, &[&user])
            .await?
            .into_iter()
            .map(|row| Order {
                id: row.get("id"),
                user: row.get("user_id"),
                status: row.get("status"),
                total_price: row.get("total_price"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    pub async fn get_order_items_by_orders(
        &self,
        order_ids: &[Id],
    ) -> Result<Vec<OrderItem>, Error> {
        const SQL: &str = "\
            SELECT id, order_id, ticket_type_id, quantity, unit_price \
            FROM order_items \
            WHERE order_id IN (SELECT unnest($1::UUID[]))";
        Ok(self
            .0
            .query(SQL, &[&order_ids])
            .await?
            .into_iter()
            .map(|row| OrderItem {
                id: row.get("id"),
                order: row.get("order_id"),
                ticket_type: row.get("ticket_type_id"),
                quantity: usize::try_from(row.get::<_, i32>("quantity"))
                    .unwrap(),
                unit_price: row.get("unit_price"),
            })
            .collect())
    }

    pub async fn get_order_items_count_by_event(
        &self,
        event: event::Id,
    ) -> Result<usize, Error> {
        const SQL: &str = "\
            SELECT COUNT(*) \
            FROM order_items \
            JOIN ticket_types ON order_items.ticket_type_id = ticket_types.id \
            WHERE ticket_types.event_id = $1";
        Ok(self
            .0
            .query_one(SQL, &[&event])
            .await?
            .get::<_, i64>(0)
            .try_into()
            .unwrap())
    }
}
