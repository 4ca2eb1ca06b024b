//! Dispatch coordinator: matches a SEARCHING trip to exactly one
//! accepting driver.
//!
//! All preconditions and the resulting mutation run inside a single
//! transaction; the claim is a conditional update on `status =
//! 'SEARCHING'`, so under N concurrent accepts exactly one matches the
//! row and the rest come back as Conflict.

pub mod timeout;

pub use timeout::{TimeoutScheduler, NO_DRIVER_AVAILABLE};

use crate::db::{repo, Repository};
use crate::domain::{DriverId, Trip, TripId, TripStatus, UserId, VerificationStatus};
use crate::error::AppError;
use crate::events::{EventHub, EventKind};
use std::sync::Arc;
use tracing::info;

pub struct Dispatch {
    repo: Arc<Repository>,
    hub: Arc<EventHub>,
}

impl Dispatch {
    pub fn new(repo: Arc<Repository>, hub: Arc<EventHub>) -> Self {
        Self { repo, hub }
    }

    /// Accept a SEARCHING trip on behalf of a driver.
    pub async fn accept(&self, trip_id: &TripId, driver_user_id: &UserId) -> Result<Trip, AppError> {
        let driver_id;
        {
            let mut tx = self.repo.begin().await?;

            // The claim leads the unit and carries every precondition
            // in its guard; once it matches, this transaction owns the
            // trip and no concurrent accept can interleave.
            let claimed = repo::trips::claim_for_driver(&mut tx, trip_id, driver_user_id).await?;
            if !claimed {
                return Err(self.diagnose_failed_claim(&mut tx, trip_id, driver_user_id).await?);
            }

            let driver = repo::drivers::get_by_user(&mut tx, driver_user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;

            let flipped = repo::drivers::set_unavailable_if_available(&mut tx, &driver.id).await?;
            if !flipped {
                // Dropping the transaction rolls the claim back.
                return Err(AppError::Conflict(
                    "driver is not available to accept trips".to_string(),
                ));
            }

            repo::trips::set_passengers_status(&mut tx, trip_id, TripStatus::Confirmed).await?;

            tx.commit().await?;
            driver_id = driver.id;
        }

        info!("Trip {} accepted by driver {}", trip_id, driver_id);
        self.announce_acceptance(trip_id, &driver_id).await
    }

    /// Work out which precondition sank the claim. Runs inside the same
    /// unit, after the failed write, so the state it reads is exactly
    /// the state the claim saw.
    async fn diagnose_failed_claim(
        &self,
        tx: &mut sqlx::SqliteConnection,
        trip_id: &TripId,
        driver_user_id: &UserId,
    ) -> Result<AppError, AppError> {
        let driver = match repo::drivers::get_by_user(tx, driver_user_id).await? {
            Some(d) => d,
            None => return Ok(AppError::NotFound("driver not found".to_string())),
        };

        if driver.verification_status != VerificationStatus::Verified {
            return Ok(AppError::Forbidden(
                "driver must be verified to accept trips".to_string(),
            ));
        }

        if !driver.is_available {
            return Ok(AppError::Conflict(
                "driver is not available to accept trips".to_string(),
            ));
        }

        let trip = match repo::trips::get(tx, trip_id).await? {
            Some(t) => t,
            None => return Ok(AppError::NotFound("trip not found".to_string())),
        };

        Ok(AppError::Conflict(format!(
            "trip not available: status is {}, expected SEARCHING",
            trip.status
        )))
    }

    /// CONFIRMED room event with the driver's profile and vehicle, plus
    /// an individual notification per passenger.
    async fn announce_acceptance(
        &self,
        trip_id: &TripId,
        driver_id: &DriverId,
    ) -> Result<Trip, AppError> {
        let mut conn = self.repo.acquire().await?;

        let trip = repo::trips::get(&mut conn, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;
        let passengers = repo::trips::passengers(&mut conn, trip_id).await?;

        let driver = repo::drivers::get(&mut conn, driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;
        let driver_user = repo::users::get(&mut conn, &driver.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("driver user not found".to_string()))?;
        let vehicle = repo::drivers::vehicle_for(&mut conn, driver_id).await?;
        let rating = repo::ratings::average_for(&mut conn, &driver.user_id)
            .await?
            .unwrap_or(0.0);

        let driver_name = driver_user.full_name();

        self.hub.emit_trip_update(
            trip_id,
            TripStatus::Confirmed,
            serde_json::json!({
                "driver": {
                    "id": driver.id,
                    "userId": driver.user_id,
                    "name": driver_name,
                    "rating": rating,
                    "vehicle": vehicle,
                }
            }),
        );

        for passenger in &passengers {
            self.hub.publish_user_event(
                &passenger.passenger_id,
                EventKind::TripNotification,
                serde_json::json!({
                    "tripId": trip_id,
                    "status": TripStatus::Confirmed,
                    "message": "A driver has accepted your trip",
                    "driverName": driver_name,
                }),
            );
        }

        Ok(trip)
    }

    /// External hook for flipping driver availability. The core only
    /// ever sets false (inside accept); re-enabling is the caller's
    /// decision.
    pub async fn set_driver_availability(
        &self,
        driver_id: &DriverId,
        available: bool,
    ) -> Result<(), AppError> {
        let mut conn = self.repo.acquire().await?;
        let updated = repo::drivers::set_availability(&mut conn, driver_id, available).await?;
        if !updated {
            return Err(AppError::NotFound("driver not found".to_string()));
        }
        Ok(())
    }
}
