pub mod calendar;
pub mod event;
pub mod order;
pub mod review;
pub mod ticket_type;
pub mod user;

pub use self::{
    event::Event, order::Order, review::Review, ticket_type::TicketType,
    user::User,
};
