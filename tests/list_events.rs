pub mod common;

#[tokio::test]
async fn lists_events_with_ticket_types_and_rating() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;

    let event = organizer
        .add_event("Listed Event", "2031-03-05T19:00:00Z")
        .await
        .unwrap();
    let ticket_type = organizer
        .add_ticket_type(event.id, "Standard", 20000, 200)
        .await
        .unwrap();

    let reviewer_email = common::unique_email("list-reviewer");
    let reviewer = common::Client::new();
    reviewer
        .register(&reviewer_email, "password1", None)
        .await
        .unwrap();
    let reviewer = reviewer.auth(&reviewer_email, "password1").await;
    reviewer.add_review(event.id, 3, "Average").await.unwrap();

    let list = common::Client::new().list_events().await.unwrap();
    assert_eq!(list.total_count, list.events.len());

    let listed = list
        .events
        .iter()
        .find(|e| e.id == event.id)
        .expect("missing event");
    assert_eq!(listed.title, "Listed Event");
    assert_eq!(listed.avg_rating, 3.0);
    assert_eq!(listed.ticket_types.len(), 1);
    assert_eq!(listed.ticket_types[0].id, ticket_type.id);
    assert_eq!(listed.ticket_types[0].price, 20000);
}

#[tokio::test]
async fn orders_events_by_start_time() {
    let organizer = common::Client::new()
        .auth("organizer@demo.com", "organizer123")
        .await;

    let earlier = organizer
        .add_event("Earlier Event", "2030-01-10T10:00:00Z")
        .await
        .unwrap();
    let later = organizer
        .add_event("Later Event", "2042-01-10T10:00:00Z")
        .await
        .unwrap();

    let list = common::Client::new().list_events().await.unwrap();
    let earlier_pos = list
        .events
        .iter()
        .position(|e| e.id == earlier.id)
        .expect("missing earlier event");
    let later_pos = list
        .events
        .iter()
        .position(|e| e.id == later.id)
        .expect("missing later event");
    assert!(earlier_pos < later_pos);
}
