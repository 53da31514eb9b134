pub mod common;

use ivent_backend::api;
use reqwest::StatusCode;

#[tokio::test]
async fn adds_ticket_type_to_own_event() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;

    let event = organizer
        .add_event("Ticketed Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();
    let ticket_type = organizer
        .add_ticket_type(event.id, "Standard", 20000, 200)
        .await
        .unwrap();
    assert_eq!(ticket_type.name, "Standard");
    assert_eq!(ticket_type.price, 20000);
    assert_eq!(ticket_type.total, 200);
    assert_eq!(ticket_type.sold, 0);
}

#[tokio::test]
async fn admin_adds_ticket_type_to_foreign_event() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Managed Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let admin = common::Client::new().auth("admin@demo.com", "admin123").await;
    let ticket_type = admin
        .add_ticket_type(event.id, "Backstage", 90000, 10)
        .await
        .unwrap();
    assert_eq!(ticket_type.name, "Backstage");
}

#[tokio::test]
async fn cant_add_ticket_type_as_regular_user() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Locked Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let user = common::Client::new().auth("user@demo.com", "user123").await;
    let status = user
        .add_ticket_type(event.id, "Standard", 20000, 200)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cant_add_ticket_type_with_zero_price() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Free Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let status = organizer
        .add_ticket_type(event.id, "Standard", 0, 200)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_add_ticket_type_to_unknown_event() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;

    let id = api::event::Id::from(uuid::Uuid::new_v4().as_u128());
    let status = organizer
        .add_ticket_type(id, "Standard", 20000, 200)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
}
