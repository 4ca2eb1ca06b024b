//! Driver location updates during an active trip.

use crate::db::{repo, Repository};
use crate::domain::{TripId, TripStatus, UserId};
use crate::engine;
use crate::error::AppError;
use crate::events::{EventHub, EventKind};
use std::sync::Arc;

/// Within this distance (km) a driver counts as "near" a trip point.
const NEAR_THRESHOLD_KM: f64 = 0.2;

pub struct TripLocation {
    repo: Arc<Repository>,
    hub: Arc<EventHub>,
}

impl TripLocation {
    pub fn new(repo: Arc<Repository>, hub: Arc<EventHub>) -> Self {
        Self { repo, hub }
    }

    /// Record the driver's position and broadcast it to the trip room.
    /// Only the trip's own driver may report, and only while the trip
    /// is CONFIRMED or IN_PROGRESS.
    pub async fn update_driver_location(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), AppError> {
        let mut conn = self.repo.acquire().await?;

        let driver = repo::drivers::get_by_user(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;

        let trip = repo::trips::get(&mut conn, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;

        let is_assigned = trip.driver_id.as_ref() == Some(&driver.id);
        let is_live = matches!(
            trip.status,
            TripStatus::Confirmed | TripStatus::InProgress
        );
        if !is_assigned || !is_live {
            return Err(AppError::NotFound(
                "trip not found or not in a state for location updates".to_string(),
            ));
        }

        repo::drivers::update_location(&mut conn, &driver.id, latitude, longitude).await?;

        self.hub.publish_trip_event(
            trip_id,
            EventKind::DriverLocation,
            serde_json::json!({
                "tripId": trip_id,
                "location": { "latitude": latitude, "longitude": longitude },
            }),
        );

        Ok(())
    }

    /// Whether the assigned driver's last known position is within the
    /// pickup threshold.
    pub async fn is_driver_near_pickup(&self, trip_id: &TripId) -> Result<bool, AppError> {
        self.is_driver_near(trip_id, true).await
    }

    /// Whether the assigned driver's last known position is within the
    /// destination threshold.
    pub async fn is_driver_near_destination(&self, trip_id: &TripId) -> Result<bool, AppError> {
        self.is_driver_near(trip_id, false).await
    }

    async fn is_driver_near(&self, trip_id: &TripId, pickup: bool) -> Result<bool, AppError> {
        let mut conn = self.repo.acquire().await?;

        let Some(trip) = repo::trips::get(&mut conn, trip_id).await? else {
            return Ok(false);
        };
        let Some(driver_id) = &trip.driver_id else {
            return Ok(false);
        };
        let Some(driver) = repo::drivers::get(&mut conn, driver_id).await? else {
            return Ok(false);
        };
        let Some(position) = driver.current_location else {
            return Ok(false);
        };

        let target = if pickup {
            &trip.start_location
        } else {
            &trip.end_location
        };

        let distance = engine::haversine_km(
            position.latitude,
            position.longitude,
            target.latitude,
            target.longitude,
        );

        Ok(distance <= NEAR_THRESHOLD_KM)
    }
}
