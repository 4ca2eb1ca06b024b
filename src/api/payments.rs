use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::db::repo;
use crate::domain::{Payment, PaymentMethod, TripId, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleBody {
    pub user_id: String,
    pub trip_id: String,
    pub method: PaymentMethod,
}

pub async fn settle(
    State(state): State<AppState>,
    Json(body): Json<SettleBody>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .settlement
        .settle(
            &TripId::new(body.trip_id),
            &UserId::new(body.user_id),
            body.method,
        )
        .await?;

    Ok(Json(payment))
}

pub async fn get_by_trip(
    Path(trip_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Payment>, AppError> {
    let mut conn = state.repo.acquire().await?;
    let payment = repo::payments::get_by_trip(&mut conn, &TripId::new(trip_id))
        .await?
        .ok_or_else(|| AppError::NotFound("no payment for this trip".to_string()))?;

    Ok(Json(payment))
}
