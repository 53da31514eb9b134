//! Initializes the database schema and inserts demo data: three fixture
//! accounts (admin, organizer, regular user) and two events with ticket
//! types. Rerunning refreshes the fixture accounts and adds another copy
//! of the demo events.

use std::error::Error;

use time::{Duration, OffsetDateTime, Time};
use tokio::{fs, task};

use ivent_backend::{api, db, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let (db_client, db_connection) = db::connect(config.db).await?;

    task::spawn(async move {
        if let Err(e) = db_connection.await {
            panic!("database connection failed: {e}");
        }
    });

    db_client.apply_schema().await?;

    let now = OffsetDateTime::now_utc();

    let admin = db::User {
        id: api::user::Id::from(1),
        email: "admin@demo.com".into(),
        name: Some("Admin".into()),
        role: api::user::Role::Admin,
        password_hash: api::user::PasswordHash::new("admin123")?,
        created_at: now,
    };
    let organizer = db::User {
        id: api::user::Id::from(2),
        email: "organizer@demo.com".into(),
        name: Some("Organizer".into()),
        role: api::user::Role::Organizer,
        password_hash: api::user::PasswordHash::new("organizer123")?,
        created_at: now,
    };
    let user = db::User {
        id: api::user::Id::from(3),
        email: "user@demo.com".into(),
        name: Some("User".into()),
        role: api::user::Role::User,
        password_hash: api::user::PasswordHash::new("user123")?,
        created_at: now,
    };
    for u in [&admin, &organizer, &user] {
        db_client.write_user(u).await?;
    }

    let concert_day = now.date() + Duration::days(3);
    let concert = db::Event {
        id: api::event::Id::new(),
        title: "Downtown Concert".into(),
        description: "An evening of live music.\n\n\
                      Open-air, family friendly, food court on site."
            .into(),
        city: "Zhytomyr".into(),
        location: "City Park".into(),
        category: "Music".into(),
        start_at: concert_day
            .with_time(Time::from_hms(19, 0, 0)?)
            .assume_utc(),
        end_at: Some(
            concert_day
                .with_time(Time::from_hms(22, 0, 0)?)
                .assume_utc(),
        ),
        image_url: Some(
            "https://images.unsplash.com/photo-1511671782779-c97d3d27a1d4"
                .into(),
        ),
        organizer: organizer.id,
        created_at: now,
    };
    db_client.write_event(&concert).await?;

    db_client
        .write_ticket_type(&db::TicketType {
            id: api::ticket_type::Id::new(),
            event: concert.id,
            name: "Standard".into(),
            price: 20000,
            total: 200,
            sold: 0,
        })
        .await?;
    db_client
        .write_ticket_type(&db::TicketType {
            id: api::ticket_type::Id::new(),
            event: concert.id,
            name: "VIP".into(),
            price: 50000,
            total: 50,
            sold: 0,
        })
        .await?;

    let exhibition_day = now.date() + Duration::days(7);
    let exhibition = db::Event {
        id: api::event::Id::new(),
        title: "Modern Art Exhibition".into(),
        description: "Works by local artists.\n\n\
                      Students enter free with a student card."
            .into(),
        city: "Zhytomyr".into(),
        location: "City Gallery".into(),
        category: "Art".into(),
        start_at: exhibition_day
            .with_time(Time::from_hms(12, 0, 0)?)
            .assume_utc(),
        end_at: Some(
            exhibition_day
                .with_time(Time::from_hms(18, 0, 0)?)
                .assume_utc(),
        ),
        image_url: Some(
            "https://images.unsplash.com/photo-1520697222865-7b2488da2e09"
                .into(),
        ),
        organizer: organizer.id,
        created_at: now,
    };
    db_client.write_event(&exhibition).await?;

    db_client
        .write_ticket_type(&db::TicketType {
            id: api::ticket_type::Id::new(),
            event: exhibition.id,
            name: "Entry ticket".into(),
            price: 8000,
            total: 300,
            sold: 0,
        })
        .await?;

    db_client
        .write_review(&db::Review {
            id: api::review::Id::new(),
            event: concert.id,
            user: admin.id,
            rating: 5,
            text: "Great event, well organized with good sound!".into(),
            created_at: now,
        })
        .await?;

    println!("seed complete");

    Ok(())
}
