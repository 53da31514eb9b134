use std::{error::Error, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use itertools::Itertools as _;
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};
use tokio::{fs, net, task};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use ivent_backend::{api, db, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let (db_client, db_connection) = db::connect(config.db).await?;

    task::spawn(async move {
        if let Err(e) = db_connection.await {
            panic!("database connection failed: {e}");
        }
    });

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    for origin in &config.http.cors.allowed_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = Router::new()
        .route("/register", post(register))
        .route("/auth", post(auth))
        .route("/user", get(get_user))
        .route("/event", get(list_events).post(add_event))
        .route("/event/:id", get(get_event).delete(delete_event))
        .route("/event/:id/ticket-type", post(add_ticket_type))
        .route("/event/:id/review", post(add_review))
        .route("/order", get(list_orders).post(buy_tickets))
        .route("/calendar", get(get_calendar))
        .layer(cors)
        .with_state(Arc::new(AppState {
            db_client,
            jwt_expiration_time: config.jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(
                config.jwt.secret.as_bytes(),
            ),
            jwt_encoding_key: EncodingKey::from_secret(
                config.jwt.secret.as_bytes(),
            ),
        }));

    let listener = net::TcpListener::bind(config.http.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Deserialize)]
struct RegisterInput {
    email: String,
    password: String,
    name: Option<String>,
}

async fn register(
    State(state): State<SharedAppState>,
    Json(RegisterInput {
        email,
        password,
        name,
    }): Json<RegisterInput>,
) -> Result<Json<api::User>, RegisterError> {
    use RegisterError as E;

    let email = email.trim().to_lowercase();
    if email.is_empty() || password.chars().count() < 6 {
        return Err(E::InvalidInput);
    }
    let name = name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let password_hash = api::user::PasswordHash::new(&password)
        .map_err(|_| E::PasswordNotHashed)?;

    let user = db::User {
        id: api::user::Id::new(),
        email,
        name,
        role: api::user::Role::User,
        password_hash,
        created_at: OffsetDateTime::now_utc(),
    };

    state.db_client.write_user(&user).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            E::EmailTaken
        } else {
            E::DbError(e)
        }
    })?;

    Ok(Json(api::User {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    }))
}

#[derive(Debug, From)]
pub enum RegisterError {
    #[from]
    DbError(db::Error),
    EmailTaken,
    InvalidInput,
    PasswordNotHashed,
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        match self {
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::DbError(_) | Self::PasswordNotHashed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct AuthInput {
    email: String,
    password: String,
}

async fn auth(
    State(state): State<SharedAppState>,
    Json(AuthInput { email, password }): Json<AuthInput>,
) -> Result<String, AuthError> {
    use AuthError as E;

    let email = email.trim().to_lowercase();

    let user = state
        .db_client
        .get_user_by_email(&email)
        .await?
        .filter(|u| u.password_hash.verify(&password))
        .ok_or(E::WrongEmailOrPassword)?;

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    encode(
        &Header::default(),
        &AuthClaims {
            user_id: user.id,
            role: user.role,
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(|_| E::InvalidToken)
}

#[derive(Debug, From)]
pub enum AuthError {
    #[from]
    DbError(db::Error),
    InvalidToken,
    WrongEmailOrPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidToken | Self::WrongEmailOrPassword => {
                StatusCode::UNAUTHORIZED
            }
        }
        .into_response()
    }
}

async fn get_user(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
) -> Result<Json<api::User>, GetUserError> {
    use GetUserError as E;

    let my = state
        .db_client
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;

    Ok(Json(api::User {
        id: my.id,
        email: my.email,
        name: my.name,
        role: my.role,
    }))
}

#[derive(Debug, From)]
pub enum GetUserError {
    #[from]
    DbError(db::Error),
    UserNotFound,
}

impl IntoResponse for GetUserError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

async fn list_events(
    State(state): State<SharedAppState>,
) -> Result<Json<api::event::List>, ListEventsError> {
    let events = state.db_client.get_events().await?;

    let event_ids = events.iter().map(|event| event.id).collect::<Vec<_>>();
    let ticket_types_fut =
        state.db_client.get_ticket_types_by_events(&event_ids);
    let ratings_fut = state.db_client.get_avg_ratings_by_events(&event_ids);
    let (ticket_types, ratings) =
        tokio::try_join!(ticket_types_fut, ratings_fut)?;

    let mut ticket_types = ticket_types
        .into_iter()
        .map(|ticket_type| (ticket_type.event, ticket_type))
        .into_group_map();

    let events = events
        .into_iter()
        .map(|event| api::Event {
            avg_rating: round_rating(
                ratings.get(&event.id).copied().unwrap_or(0.0),
            ),
            ticket_types: ticket_types
                .remove(&event.id)
                .unwrap_or_default()
                .into_iter()
                .map(|ticket_type| api::TicketType {
                    id: ticket_type.id,
                    name: ticket_type.name,
                    price: ticket_type.price,
                    total: ticket_type.total,
                    sold: ticket_type.sold,
                })
                .collect(),
            id: event.id,
            title: event.title,
            description: event.description,
            city: event.city,
            location: event.location,
            category: event.category,
            start_at: event.start_at,
            end_at: event.end_at,
            image_url: event.image_url,
        })
        .collect::<Vec<_>>();

    Ok(Json(api::event::List {
        total_count: events.len(),
        events,
    }))
}

#[derive(Debug, From)]
pub enum ListEventsError {
    #[from]
    DbError(db::Error),
}

impl IntoResponse for ListEventsError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn get_event(
    State(state): State<SharedAppState>,
    Path(id): Path<api::event::Id>,
) -> Result<Json<api::event::Details>, GetEventError> {
    use GetEventError as E;

    let state = &state;

    let event = state
        .db_client
        .get_event_by_id(id)
        .await?
        .ok_or(E::EventNotFound)?;

    let event_ids = [event.id];
    let ticket_types_fut =
        state.db_client.get_ticket_types_by_events(&event_ids);
    let reviews_fut = state.db_client.get_reviews_by_event(event.id);
    let organizer_fut = state.db_client.get_user_by_id(event.organizer);
    let (ticket_types, reviews, organizer) =
        tokio::try_join!(ticket_types_fut, reviews_fut, organizer_fut)?;
    let organizer = organizer.ok_or(E::UserNotFound)?;

    let user_ids = reviews
        .iter()
        .map(|review| review.user)
        .unique()
        .collect::<Vec<_>>();
    let users = state.db_client.get_users_by_ids(&user_ids).await?;

    let avg_rating = if reviews.is_empty() {
        0.0
    } else {
        round_rating(
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>()
                / reviews.len() as f64,
        )
    };

    let reviews = reviews
        .into_iter()
        .map(|review| {
            let user =
                users.get(&review.user).ok_or(E::UserNotFound)?;
            Ok::<_, E>(api::Review {
                id: review.id,
                rating: review.rating,
                text: review.text,
                created_at: review.created_at,
                user: api::User {
                    id: user.id,
                    email: user.email.clone(),
                    name: user.name.clone(),
                    role: user.role,
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(api::event::Details {
        id: event.id,
        title: event.title,
        description: event.description,
        city: event.city,
        location: event.location,
        category: event.category,
        start_at: event.start_at,
        end_at: event.end_at,
        image_url: event.image_url,
        avg_rating,
        ticket_types: ticket_types
            .into_iter()
            .map(|ticket_type| api::TicketType {
                id: ticket_type.id,
                name: ticket_type.name,
                price: ticket_type.price,
                total: ticket_type.total,
                sold: ticket_type.sold,
            })
            .collect(),
        organizer: api::User {
            id: organizer.id,
            email: organizer.email,
            name: organizer.name,
            role: organizer.role,
        },
        reviews,
    }))
}

#[derive(Debug, From)]
pub enum GetEventError {
    #[from]
    DbError(db::Error),
    EventNotFound,
    UserNotFound,
}

impl IntoResponse for GetEventError {
    fn into_response(self) -> Response {
        match self {
            Self::EventNotFound => StatusCode::NOT_FOUND,
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddEventInput {
    title: String,
    description: String,
    city: String,
    location: String,
    category: String,
    #[serde(with = "time::serde::rfc3339")]
    start_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    end_at: Option<OffsetDateTime>,
    image_url: Option<String>,
}

async fn add_event(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(input): Json<AddEventInput>,
) -> Result<Json<api::Event>, AddEventError> {
    use api::user::Role;
    use AddEventError as E;

    if !matches!(auth_claims.role, Role::Organizer | Role::Admin) {
        return Err(E::Forbidden);
    }

    let title = input.title.trim().to_string();
    let description = input.description.trim().to_string();
    let city = input.city.trim().to_string();
    let location = input.location.trim().to_string();
    let category = input.category.trim().to_string();
    if [&title, &description, &city, &location, &category]
        .iter()
        .any(|field| field.is_empty())
    {
        return Err(E::InvalidInput);
    }

    let event = db::Event {
        id: api::event::Id::new(),
        title,
        description,
        city,
        location,
        category,
        start_at: input.start_at,
        end_at: input.end_at,
        image_url: input.image_url.filter(|url| !url.is_empty()),
        organizer: auth_claims.user_id,
        created_at: OffsetDateTime::now_utc(),
    };

    state.db_client.write_event(&event).await?;

    Ok(Json(api::Event {
        id: event.id,
        title: event.title,
        description: event.description,
        city: event.city,
        location: event.location,
        category: event.category,
        start_at: event.start_at,
        end_at: event.end_at,
        image_url: event.image_url,
        avg_rating: 0.0,
        ticket_types: Vec::new(),
    }))
}

#[derive(Debug, From)]
pub enum AddEventError {
    #[from]
    DbError(db::Error),
    Forbidden,
    InvalidInput,
}

impl IntoResponse for AddEventError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn delete_event(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::event::Id>,
) -> Result<StatusCode, DeleteEventError> {
    use api::user::Role;
    use DeleteEventError as E;

    if !matches!(auth_claims.role, Role::Organizer | Role::Admin) {
        return Err(E::Forbidden);
    }

    let event = state
        .db_client
        .get_event_by_id(id)
        .await?
        .ok_or(E::EventNotFound)?;
    if auth_claims.role != Role::Admin
        && event.organizer != auth_claims.user_id
    {
        return Err(E::Forbidden);
    }

    let ordered = state.db_client.get_order_items_count_by_event(id).await?;
    if ordered > 0 {
        return Err(E::HasOrders);
    }

    if !state.db_client.delete_event(id).await? {
        return Err(E::EventNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, From)]
pub enum DeleteEventError {
    #[from]
    DbError(db::Error),
    EventNotFound,
    Forbidden,
    HasOrders,
}

impl IntoResponse for DeleteEventError {
    fn into_response(self) -> Response {
        match self {
            Self::EventNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::HasOrders => StatusCode::CONFLICT,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct AddTicketTypeInput {
    name: String,
    /// Unit price in minor currency units.
    price: i64,
    total: usize,
}

async fn add_ticket_type(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::event::Id>,
    Json(AddTicketTypeInput { name, price, total }): Json<
        AddTicketTypeInput,
    >,
) -> Result<Json<api::TicketType>, AddTicketTypeError> {
    use api::user::Role;
    use AddTicketTypeError as E;

    if !matches!(auth_claims.role, Role::Organizer | Role::Admin) {
        return Err(E::Forbidden);
    }

    let name = name.trim().to_string();
    if name.chars().count() < 2 || price < 1 || total < 1 {
        return Err(E::InvalidInput);
    }

    let event = state
        .db_client
        .get_event_by_id(id)
        .await?
        .ok_or(E::EventNotFound)?;
    if auth_claims.role != Role::Admin
        && event.organizer != auth_claims.user_id
    {
        return Err(E::Forbidden);
    }

    let ticket_type = db::TicketType {
        id: api::ticket_type::Id::new(),
        event: event.id,
        name,
        price,
        total,
        sold: 0,
    };

    state.db_client.write_ticket_type(&ticket_type).await?;

    Ok(Json(api::TicketType {
        id: ticket_type.id,
        name: ticket_type.name,
        price: ticket_type.price,
        total: ticket_type.total,
        sold: ticket_type.sold,
    }))
}

#[derive(Debug, From)]
pub enum AddTicketTypeError {
    #[from]
    DbError(db::Error),
    EventNotFound,
    Forbidden,
    InvalidInput,
}

impl IntoResponse for AddTicketTypeError {
    fn into_response(self) -> Response {
        match self {
            Self::EventNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct AddReviewInput {
    rating: u8,
    text: String,
}

async fn add_review(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Path(id): Path<api::event::Id>,
    Json(AddReviewInput { rating, text }): Json<AddReviewInput>,
) -> Result<Json<api::Review>, AddReviewError> {
    use AddReviewError as E;

    let text = text.trim().to_string();
    if !(1..=5).contains(&rating) || text.chars().count() < 3 {
        return Err(E::InvalidInput);
    }

    let my = state
        .db_client
        .get_user_by_id(auth_claims.user_id)
        .await?
        .ok_or(E::UserNotFound)?;
    let event = state
        .db_client
        .get_event_by_id(id)
        .await?
        .ok_or(E::EventNotFound)?;

    let review = db::Review {
        id: api::review::Id::new(),
        event: event.id,
        user: my.id,
        rating,
        text,
        created_at: OffsetDateTime::now_utc(),
    };

    state.db_client.write_review(&review).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            E::AlreadyReviewed
        } else {
            E::DbError(e)
        }
    })?;

    Ok(Json(api::Review {
        id: review.id,
        rating: review.rating,
        text: review.text,
        created_at: review.created_at,
        user: api::User {
            id: my.id,
            email: my.email,
            name: my.name,
            role: my.role,
        },
    }))
}

#[derive(Debug, From)]
pub enum AddReviewError {
    #[from]
    DbError(db::Error),
    AlreadyReviewed,
    EventNotFound,
    InvalidInput,
    UserNotFound,
}

impl IntoResponse for AddReviewError {
    fn into_response(self) -> Response {
        match self {
            Self::AlreadyReviewed => StatusCode::CONFLICT,
            Self::EventNotFound => StatusCode::NOT_FOUND,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::DbError(_) | Self::UserNotFound => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyTicketsInput {
    ticket_type_id: api::ticket_type::Id,
    quantity: usize,
}

async fn buy_tickets(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
    Json(BuyTicketsInput {
        ticket_type_id,
        quantity,
    }): Json<BuyTicketsInput>,
) -> Result<Json<api::order::Receipt>, BuyTicketsError> {
    use db::order::Reservation;
    use BuyTicketsError as E;

    // The reservation assumes an already validated quantity.
    if !(1..=10).contains(&quantity) {
        return Err(E::InvalidQuantity);
    }

    let reservation = state
        .db_client
        .reserve(ticket_type_id, quantity, auth_claims.user_id)
        .await?;

    match reservation {
        Reservation::Reserved {
            order,
            total_price,
            event,
        } => Ok(Json(api::order::Receipt {
            order_id: order,
            total_price,
            event_id: event,
        })),
        Reservation::TicketTypeNotFound => Err(E::TicketTypeNotFound),
        Reservation::InsufficientInventory => Err(E::InsufficientInventory),
    }
}

#[derive(Debug, From)]
pub enum BuyTicketsError {
    #[from]
    DbError(db::Error),
    InsufficientInventory,
    InvalidQuantity,
    TicketTypeNotFound,
}

impl IntoResponse for BuyTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(e) if db::is_transient(&e) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InsufficientInventory => StatusCode::CONFLICT,
            Self::InvalidQuantity => StatusCode::BAD_REQUEST,
            Self::TicketTypeNotFound => StatusCode::NOT_FOUND,
        }
        .into_response()
    }
}

async fn list_orders(
    State(state): State<SharedAppState>,
    auth_claims: AuthClaims,
) -> Result<Json<api::order::List>, ListOrdersError> {
    use ListOrdersError as E;

    let orders = state
        .db_client
        .get_orders_by_user(auth_claims.user_id)
        .await?;

    let order_ids = orders.iter().map(|order| order.id).collect::<Vec<_>>();
    let items = state.db_client.get_order_items_by_orders(&order_ids).await?;

    let ticket_type_ids = items
        .iter()
        .map(|item| item.ticket_type)
        .unique()
        .collect::<Vec<_>>();
    let ticket_types = state
        .db_client
        .get_ticket_types_by_ids(&ticket_type_ids)
        .await?;

    let event_ids = ticket_types
        .values()
        .map(|ticket_type| ticket_type.event)
        .unique()
        .collect::<Vec<_>>();
    let events = state.db_client.get_events_by_ids(&event_ids).await?;

    let mut items = items
        .into_iter()
        .map(|item| (item.order, item))
        .into_group_map();

    let orders = orders
        .into_iter()
        .map(|order| {
            let items = items
                .remove(&order.id)
                .unwrap_or_default()
                .into_iter()
                .map(|item| {
                    let ticket_type = ticket_types
                        .get(&item.ticket_type)
                        .ok_or(E::TicketTypeNotFound(item.ticket_type))?;
                    let event = events
                        .get(&ticket_type.event)
                        .ok_or(E::EventNotFound(ticket_type.event))?;
                    Ok::<_, E>(api::order::Item {
                        event_id: event.id,
                        event_title: event.title.clone(),
                        ticket_type_id: ticket_type.id,
                        ticket_type_name: ticket_type.name.clone(),
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, E>(api::Order {
                id: order.id,
                status: order.status,
                total_price: order.total_price,
                created_at: order.created_at,
                items,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(api::order::List {
        total_count: orders.len(),
        orders,
    }))
}

#[derive(Debug, From)]
pub enum ListOrdersError {
    #[from]
    DbError(db::Error),
    EventNotFound(api::event::Id),
    TicketTypeNotFound(api::ticket_type::Id),
}

impl IntoResponse for ListOrdersError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(_)
            | Self::EventNotFound(_)
            | Self::TicketTypeNotFound(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct GetCalendarInput {
    month: Option<String>,
}

async fn get_calendar(
    State(state): State<SharedAppState>,
    Query(GetCalendarInput { month }): Query<GetCalendarInput>,
) -> Result<Json<api::calendar::Month>, GetCalendarError> {
    use GetCalendarError as E;

    let (year, month) = match &month {
        Some(raw) => parse_month(raw).ok_or(E::InvalidMonth)?,
        None => {
            let today = OffsetDateTime::now_utc().date();
            (today.year(), today.month())
        }
    };

    let from = Date::from_calendar_date(year, month, 1)
        .map_err(|_| E::InvalidMonth)?
        .midnight()
        .assume_utc();
    let to = match month.next() {
        Month::January => {
            Date::from_calendar_date(year + 1, Month::January, 1)
        }
        next => Date::from_calendar_date(year, next, 1),
    }
    .map_err(|_| E::InvalidMonth)?
    .midnight()
    .assume_utc();

    let events = state.db_client.get_events_in_range(from, to).await?;

    // Events arrive ordered by start time, so each day's group keeps
    // that order.
    let mut by_day = events
        .into_iter()
        .map(|event| (event.start_at.date(), event))
        .into_group_map();

    let dates = by_day.keys().copied().sorted().collect::<Vec<_>>();
    let days = dates
        .into_iter()
        .map(|date| api::calendar::Day {
            date: format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day(),
            ),
            events: by_day
                .remove(&date)
                .unwrap_or_default()
                .into_iter()
                .map(|event| api::calendar::Entry {
                    id: event.id,
                    title: event.title,
                    start_at: event.start_at,
                    city: event.city,
                    category: event.category,
                })
                .collect(),
        })
        .collect();

    Ok(Json(api::calendar::Month {
        month: format!("{year:04}-{:02}", u8::from(month)),
        days,
    }))
}

#[derive(Debug, From)]
pub enum GetCalendarError {
    #[from]
    DbError(db::Error),
    InvalidMonth,
}

impl IntoResponse for GetCalendarError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidMonth => StatusCode::BAD_REQUEST,
            Self::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

/// Parses a `YYYY-MM` month designator.
fn parse_month(raw: &str) -> Option<(i32, Month)> {
    let (year, month) = raw.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year = year.parse::<i32>().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Some((year, month))
}

fn round_rating(avg: f64) -> f64 {
    (avg * 100.0).round() / 100.0
}

type SharedAppState = Arc<AppState>;

struct AppState {
    db_client: db::Client,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    user_id: api::user::Id,
    role: api::user::Role,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}
