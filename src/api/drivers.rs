use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::domain::DriverId;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityBody {
    pub available: bool,
}

/// The external re-enable hook: dispatch only ever flips availability
/// off, so freeing a driver again comes through here.
pub async fn set_availability(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AvailabilityBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let driver_id = DriverId::new(id);
    state
        .dispatch
        .set_driver_availability(&driver_id, body.available)
        .await?;

    Ok(Json(json!({
        "driverId": driver_id,
        "available": body.available,
    })))
}
