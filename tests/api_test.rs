mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use rideline::domain::UserRole;
use serde_json::json;
use tower::util::ServiceExt;

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn patch(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_trip_body(user_id: &str) -> serde_json::Value {
    json!({
        "userId": user_id,
        "type": "ON_DEMAND",
        "startLocation": { "latitude": -0.18, "longitude": -78.48, "address": "Av. Amazonas 100" },
        "endLocation": { "latitude": -0.20, "longitude": -78.50, "address": "Av. Patria 200" },
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup().await;

    let response = app.router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_trip_endpoint() {
    let (app, _temp) = setup().await;
    seed_tariff(&app.repo).await;
    let passenger = seed_passenger(&app.repo).await;

    let response = app
        .router()
        .oneshot(post("/v1/trips", create_trip_body(passenger.as_str())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "SEARCHING");
    assert_eq!(body["type"], "ON_DEMAND");
    assert_eq!(body["fare"], 5.3);
}

#[tokio::test]
async fn test_create_trip_unknown_user_is_404() {
    let (app, _temp) = setup().await;
    seed_tariff(&app.repo).await;

    let response = app
        .router()
        .oneshot(post("/v1/trips", create_trip_body("no-such-user")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trip_detail_hides_trips_from_outsiders() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    let outsider = seed_user(&app.repo, UserRole::Passenger).await;

    let response = app
        .router()
        .oneshot(get(&format!("/v1/trips/{}?userId={}", trip_id, passenger)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["passengers"].as_array().unwrap().len(), 1);

    let response = app
        .router()
        .oneshot(get(&format!("/v1/trips/{}?userId={}", trip_id, outsider)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accept_and_invalid_transition_statuses() {
    let (app, _temp) = setup().await;
    let (trip_id, _passenger) = create_searching_trip(&app).await;
    let (driver_user, _) = seed_driver(&app.repo).await;

    let response = app
        .router()
        .oneshot(post(
            &format!("/v1/trips/{}/accept", trip_id),
            json!({ "userId": driver_user.as_str() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "CONFIRMED");

    // CONFIRMED -> COMPLETED skips IN_PROGRESS and must 409.
    let response = app
        .router()
        .oneshot(patch(
            &format!("/v1/trips/{}", trip_id),
            json!({ "userId": driver_user.as_str(), "status": "COMPLETED" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("CONFIRMED"), "message was: {}", message);
    assert!(message.contains("COMPLETED"), "message was: {}", message);
}

#[tokio::test]
async fn test_settlement_endpoint() {
    let (app, _temp) = setup().await;
    let (trip_id, passenger) = create_searching_trip(&app).await;
    complete_trip(&app, &trip_id).await;

    let response = app
        .router()
        .oneshot(post(
            "/v1/payments",
            json!({
                "userId": passenger.as_str(),
                "tripId": trip_id.as_str(),
                "method": "CASH",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["amount"], 5.3);

    // The payment is queryable by trip, and a second settle conflicts.
    let response = app
        .router()
        .oneshot(get(&format!("/v1/payments/trip/{}", trip_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router()
        .oneshot(post(
            "/v1/payments",
            json!({
                "userId": passenger.as_str(),
                "tripId": trip_id.as_str(),
                "method": "CASH",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wallet_endpoints() {
    let (app, _temp) = setup().await;
    let user = seed_passenger(&app.repo).await;
    seed_wallet(&app.repo, &user, 0).await;

    let response = app
        .router()
        .oneshot(post(
            &format!("/v1/wallets/{}/deposit", user),
            json!({ "amount": 25.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["wallet"]["balance"], 25.0);

    let response = app
        .router()
        .oneshot(post(
            &format!("/v1/wallets/{}/withdraw", user),
            json!({ "amount": 100.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router()
        .oneshot(get(&format!("/v1/wallets/{}/transactions", user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_driver_availability_endpoint() {
    let (app, _temp) = setup().await;
    let (_driver_user, driver_id) = seed_driver(&app.repo).await;

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/drivers/{}/availability", driver_id))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "available": false }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["available"], false);
}
