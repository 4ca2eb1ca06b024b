use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::domain::{Money, PromoApplication, TripType};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPromoBody {
    pub code: String,
    pub amount: Money,
    pub trip_type: TripType,
}

pub async fn apply(
    State(state): State<AppState>,
    Json(body): Json<ApplyPromoBody>,
) -> Result<Json<PromoApplication>, AppError> {
    let result = state
        .promotions
        .apply(&body.code, body.amount, body.trip_type)
        .await?;
    Ok(Json(result))
}
