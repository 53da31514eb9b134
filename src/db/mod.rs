pub mod event;
pub mod order;
pub mod review;
pub mod ticket_type;
pub mod user;

use crate::config;

use tokio_postgres::{error::SqlState, tls::NoTlsStream, NoTls, Socket};

pub use tokio_postgres::Error;

pub use self::{
    event::Event, order::Order, review::Review, ticket_type::TicketType,
    user::User,
};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

pub async fn connect(
    config: config::Db,
) -> Result<(Client, Connection), Error> {
    tokio_postgres::connect(&config.url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))
}

pub struct Client(tokio_postgres::Client);

impl Client {
    /// Applies `schema.sql`. Every statement is `IF NOT EXISTS`, so this
    /// is safe to run against an already initialized database.
    pub async fn apply_schema(&self) -> Result<(), Error> {
        const SCHEMA: &str = include_str!("../../schema.sql");
        self.0.batch_execute(SCHEMA).await
    }
}

/// Whether the error is the store rejecting a row that already exists
/// (taken email, second review for the same event).
pub fn is_unique_violation(e: &Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// Whether retrying the whole statement may succeed: the connection is
/// gone, or the store aborted the statement under contention. No partial
/// effects persist in either case.
pub fn is_transient(e: &Error) -> bool {
    e.is_closed()
        || e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE)
        || e.code() == Some(&SqlState::T_R_DEADLOCK_DETECTED)
}
