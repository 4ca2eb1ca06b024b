mod common;

use common::*;
use futures::future::join_all;
use rideline::db::repo;
use rideline::domain::{TripStatus, VerificationStatus};
use rideline::error::AppError;

#[tokio::test]
async fn test_accept_assigns_driver_and_flips_availability() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (driver_user, driver_id) = seed_driver(&app.repo).await;

    let trip = app
        .dispatch
        .accept(&trip_id, &driver_user)
        .await
        .expect("accept failed");

    assert_eq!(trip.status, TripStatus::Confirmed);
    assert_eq!(trip.driver_id, Some(driver_id.clone()));

    let mut conn = app.repo.acquire().await.unwrap();
    let driver = repo::drivers::get(&mut conn, &driver_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!driver.is_available, "acceptance must free-flip exactly once");

    let passengers = repo::trips::passengers(&mut conn, &trip_id).await.unwrap();
    assert!(passengers
        .iter()
        .all(|p| p.status == TripStatus::Confirmed));
}

#[tokio::test]
async fn test_unverified_driver_is_forbidden() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (driver_user, _) =
        seed_driver_with(&app.repo, true, VerificationStatus::Pending).await;

    let result = app.dispatch.accept(&trip_id, &driver_user).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_unavailable_driver_conflicts() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (driver_user, _) =
        seed_driver_with(&app.repo, false, VerificationStatus::Verified).await;

    let result = app.dispatch.accept(&trip_id, &driver_user).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_unknown_driver_not_found() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;

    // A passenger user has no driver row
    let result = app.dispatch.accept(&trip_id, &passenger).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_second_accept_conflicts_with_statuses() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (first_user, _) = seed_driver(&app.repo).await;
    let (second_user, _) = seed_driver(&app.repo).await;

    app.dispatch.accept(&trip_id, &first_user).await.unwrap();

    let result = app.dispatch.accept(&trip_id, &second_user).await;
    match result {
        Err(AppError::Conflict(msg)) => {
            assert!(msg.contains("CONFIRMED"), "message was: {}", msg);
            assert!(msg.contains("SEARCHING"), "message was: {}", msg);
        }
        other => panic!("expected Conflict, got {:?}", other.map(|t| t.status)),
    }
}

#[tokio::test]
async fn test_concurrent_accepts_have_exactly_one_winner() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;

    let mut drivers = Vec::new();
    for _ in 0..5 {
        drivers.push(seed_driver(&app.repo).await);
    }

    let attempts = drivers.iter().map(|(user, _)| {
        let dispatch = app.dispatch.clone();
        let trip_id = trip_id.clone();
        let user = user.clone();
        async move { dispatch.accept(&trip_id, &user).await }
    });

    let results = join_all(attempts).await;

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one accept must succeed");

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, AppError::Conflict(_)),
                "losers must see Conflict, got {:?}",
                e
            );
        }
    }

    // The trip holds exactly the winner's assignment, and only the
    // winner lost availability.
    let trip = get_trip(&app.repo, &trip_id).await;
    assert_eq!(trip.status, TripStatus::Confirmed);
    let assigned = trip.driver_id.expect("trip must have a driver");

    let mut conn = app.repo.acquire().await.unwrap();
    let mut unavailable = 0;
    for (_, driver_id) in &drivers {
        let driver = repo::drivers::get(&mut conn, driver_id)
            .await
            .unwrap()
            .unwrap();
        if !driver.is_available {
            unavailable += 1;
            assert_eq!(driver.id, assigned);
        }
    }
    assert_eq!(unavailable, 1);
}

#[tokio::test]
async fn test_driver_cannot_hold_two_trips() {
    let (app, _temp) = setup().await;
    let (first_trip, _) = create_searching_trip(&app).await;
    let second_passenger = seed_passenger(&app.repo).await;
    let second_trip = app
        .creator
        .create(&second_passenger, on_demand_request())
        .await
        .unwrap()
        .id;

    let (driver_user, _) = seed_driver(&app.repo).await;

    app.dispatch.accept(&first_trip, &driver_user).await.unwrap();

    let result = app.dispatch.accept(&second_trip, &driver_user).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let trip = get_trip(&app.repo, &second_trip).await;
    assert_eq!(trip.status, TripStatus::Searching, "claim must roll back");
}

#[tokio::test]
async fn test_subscriber_receives_confirmation_event() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let (driver_user, _) = seed_driver(&app.repo).await;

    let (session, mut rx) = app.hub.register(passenger.clone());
    app.hub
        .subscribe_trip(&app.repo, session, &trip_id)
        .await
        .expect("subscribe failed");

    app.dispatch.accept(&trip_id, &driver_user).await.unwrap();

    let event = rx.try_recv().expect("no room event delivered");
    assert_eq!(event.event, "trip_updated");
    assert_eq!(event.data["status"], "CONFIRMED");
    assert!(event.data["driver"]["name"].is_string());

    // The per-user notification also lands on the passenger's channel.
    let notification = rx.try_recv().expect("no user notification delivered");
    assert_eq!(notification.event, "trip_notification");
}

#[tokio::test]
async fn test_subscribe_requires_trip_access() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let outsider = seed_passenger(&app.repo).await;

    let (session, _rx) = app.hub.register(outsider);
    let result = app.hub.subscribe_trip(&app.repo, session, &trip_id).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_availability_hook_reenables_driver() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (driver_user, driver_id) = seed_driver(&app.repo).await;

    app.dispatch.accept(&trip_id, &driver_user).await.unwrap();

    app.dispatch
        .set_driver_availability(&driver_id, true)
        .await
        .expect("hook failed");

    let mut conn = app.repo.acquire().await.unwrap();
    let driver = repo::drivers::get(&mut conn, &driver_id)
        .await
        .unwrap()
        .unwrap();
    assert!(driver.is_available);
}
