use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::repo;
use crate::domain::{Trip, TripId, TripPassenger, TripStatus, UserId};
use crate::error::AppError;
use crate::lifecycle::CreateTripRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripBody {
    pub user_id: String,
    #[serde(flatten)]
    pub request: CreateTripRequest,
}

pub async fn create_trip(
    State(state): State<AppState>,
    Json(body): Json<CreateTripBody>,
) -> Result<Json<Trip>, AppError> {
    let user_id = UserId::new(body.user_id);
    let trip = state.creator.create(&user_id, body.request).await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub passengers: Vec<TripPassenger>,
}

pub async fn get_trip(
    Path(id): Path<String>,
    Query(params): Query<TripQuery>,
    State(state): State<AppState>,
) -> Result<Json<TripDetail>, AppError> {
    let trip_id = TripId::new(id);
    let user_id = UserId::new(params.user_id);

    let mut conn = state.repo.acquire().await?;

    // Access check doubles as existence: outsiders see the same 404.
    if !repo::trips::is_party(&mut conn, &trip_id, &user_id).await? {
        return Err(AppError::NotFound("trip not found".to_string()));
    }

    let trip = repo::trips::get(&mut conn, &trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;
    let passengers = repo::trips::passengers(&mut conn, &trip_id).await?;

    Ok(Json(TripDetail { trip, passengers }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripBody {
    pub user_id: String,
    pub status: TripStatus,
    pub cancellation_reason: Option<String>,
}

/// Covers both advanceTrip and cancelTrip: the body carries the target
/// status and the lifecycle module enforces the table.
pub async fn update_trip(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<UpdateTripBody>,
) -> Result<Json<Trip>, AppError> {
    let trip_id = TripId::new(id);
    let user_id = UserId::new(body.user_id);

    let trip = state
        .updater
        .advance(&trip_id, &user_id, body.status, body.cancellation_reason)
        .await?;

    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptTripBody {
    pub user_id: String,
}

pub async fn accept_trip(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AcceptTripBody>,
) -> Result<Json<Trip>, AppError> {
    let trip_id = TripId::new(id);
    let user_id = UserId::new(body.user_id);

    let trip = state.dispatch.accept(&trip_id, &user_id).await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationBody {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub async fn update_location(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<UpdateLocationBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let trip_id = TripId::new(id);
    let user_id = UserId::new(body.user_id);

    state
        .location
        .update_driver_location(&trip_id, &user_id, body.latitude, body.longitude)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTripBody {
    pub from_user_id: String,
    pub to_user_id: String,
    pub score: i64,
    pub comment: Option<String>,
}

pub async fn rate_trip(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RateTripBody>,
) -> Result<Json<crate::domain::Rating>, AppError> {
    let trip_id = TripId::new(id);

    let rating = state
        .ratings
        .rate(
            &trip_id,
            &UserId::new(body.from_user_id),
            &UserId::new(body.to_user_id),
            body.score,
            body.comment,
        )
        .await?;

    Ok(Json(rating))
}
