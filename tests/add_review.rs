pub mod common;

use ivent_backend::api;
use reqwest::StatusCode;

#[tokio::test]
async fn adds_review_and_updates_average() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Reviewed Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let reviewer_email = common::unique_email("reviewer");
    let reviewer = common::Client::new();
    reviewer
        .register(&reviewer_email, "password1", Some("Reviewer"))
        .await
        .unwrap();
    let reviewer = reviewer.auth(&reviewer_email, "password1").await;

    let review = reviewer
        .add_review(event.id, 4, "Good lineup")
        .await
        .unwrap();
    assert_eq!(review.rating, 4);
    assert_eq!(review.text, "Good lineup");
    assert_eq!(review.user.name.as_deref(), Some("Reviewer"));

    let details = reviewer.get_event(event.id).await.unwrap();
    assert_eq!(details.avg_rating, 4.0);
    assert_eq!(details.reviews.len(), 1);
    assert_eq!(details.reviews[0].rating, 4);
}

#[tokio::test]
async fn averages_over_multiple_reviewers() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Averaged Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    for (prefix, rating) in [("avg-a", 4), ("avg-b", 5)] {
        let email = common::unique_email(prefix);
        let reviewer = common::Client::new();
        reviewer.register(&email, "password1", None).await.unwrap();
        let reviewer = reviewer.auth(&email, "password1").await;
        reviewer.add_review(event.id, rating, "Worth it").await.unwrap();
    }

    let details = organizer.get_event(event.id).await.unwrap();
    assert_eq!(details.avg_rating, 4.5);
    assert_eq!(details.reviews.len(), 2);
}

#[tokio::test]
async fn cant_review_same_event_twice() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Once Reviewed", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let email = common::unique_email("twice");
    let reviewer = common::Client::new();
    reviewer.register(&email, "password1", None).await.unwrap();
    let reviewer = reviewer.auth(&email, "password1").await;

    reviewer.add_review(event.id, 5, "Loved it").await.unwrap();
    let status = reviewer
        .add_review(event.id, 1, "Changed my mind")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::CONFLICT);

    // The first review stays untouched.
    let details = reviewer.get_event(event.id).await.unwrap();
    assert_eq!(details.reviews.len(), 1);
    assert_eq!(details.reviews[0].rating, 5);
}

#[tokio::test]
async fn cant_review_with_invalid_rating() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Strict Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let user = common::Client::new().auth("user@demo.com", "user123").await;
    let status = user.add_review(event.id, 6, "Too good").await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = user.add_review(event.id, 3, "ok").await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_review_unknown_event() {
    let user = common::Client::new().auth("user@demo.com", "user123").await;

    let id = api::event::Id::from(uuid::Uuid::new_v4().as_u128());
    let status = user.add_review(id, 5, "Ghost event").await.unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cant_review_when_unauthorized() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;
    let event = organizer
        .add_event("Members Only", "2031-03-05T19:00:00Z")
        .await
        .unwrap();

    let status = common::Client::new()
        .add_review(event.id, 5, "Sneaky")
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
