//! Applies validated status transitions: trip + passenger rows move
//! together inside one atomic unit, then events and notifications fan
//! out.

use crate::db::{repo, Repository};
use crate::domain::{Trip, TripId, TripPassenger, TripStatus, UserId};
use crate::error::AppError;
use crate::events::{EventHub, EventKind};
use crate::lifecycle::transitions::{self, Actor};
use std::sync::Arc;
use tracing::info;

/// Default reason when a trip cancels because every passenger did.
pub const ALL_PASSENGERS_CANCELLED: &str = "all passengers cancelled";

pub struct TripUpdater {
    repo: Arc<Repository>,
    hub: Arc<EventHub>,
}

impl TripUpdater {
    pub fn new(repo: Arc<Repository>, hub: Arc<EventHub>) -> Self {
        Self { repo, hub }
    }

    /// Apply a status change requested by a user, resolving their role
    /// on this trip first.
    pub async fn advance(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        status: TripStatus,
        reason: Option<String>,
    ) -> Result<Trip, AppError> {
        let (trip, is_driver, is_passenger) = {
            let mut conn = self.repo.acquire().await?;

            let trip = repo::trips::get(&mut conn, trip_id)
                .await?
                .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;

            let driver = repo::drivers::get_by_user(&mut conn, user_id).await?;
            let is_driver = match (&driver, &trip.driver_id) {
                (Some(d), Some(td)) => d.id == *td,
                _ => false,
            };

            let passengers = repo::trips::passengers(&mut conn, trip_id).await?;
            let is_passenger = passengers.iter().any(|p| p.passenger_id == *user_id);

            (trip, is_driver, is_passenger)
        };

        if is_driver {
            self.driver_update(&trip, status, reason).await
        } else if is_passenger {
            self.passenger_update(&trip, user_id, status, reason).await
        } else {
            Err(AppError::Forbidden(
                "user is not a party to this trip".to_string(),
            ))
        }
    }

    /// Driver-initiated transition: cascades the new status to every
    /// passenger row.
    async fn driver_update(
        &self,
        trip: &Trip,
        status: TripStatus,
        reason: Option<String>,
    ) -> Result<Trip, AppError> {
        transitions::validate(trip.status, status, Actor::Driver)?;
        self.apply_with_notification(&trip.id, trip.status, status, reason)
            .await
    }

    /// Passenger-initiated cancel: only this passenger's row moves; the
    /// trip follows once no active passengers remain.
    async fn passenger_update(
        &self,
        trip: &Trip,
        user_id: &UserId,
        status: TripStatus,
        reason: Option<String>,
    ) -> Result<Trip, AppError> {
        transitions::validate(trip.status, status, Actor::Passenger)?;

        let trip_cancelled;
        let cascade_reason = reason
            .clone()
            .unwrap_or_else(|| ALL_PASSENGERS_CANCELLED.to_string());
        {
            let mut tx = self.repo.begin().await?;

            repo::trips::set_passenger_status(&mut tx, &trip.id, user_id, status).await?;

            let active = repo::trips::count_active_passengers(&mut tx, &trip.id).await?;
            trip_cancelled = if active == 0 {
                repo::trips::cancel_if_active(&mut tx, &trip.id, &cascade_reason).await?
            } else {
                false
            };

            tx.commit().await?;
        }

        if trip_cancelled {
            info!("Trip {} cancelled: {}", trip.id, cascade_reason);
            self.hub.emit_trip_update(
                &trip.id,
                TripStatus::Cancelled,
                serde_json::json!({ "reason": cascade_reason }),
            );
            self.notify_parties(&trip.id, TripStatus::Cancelled, Some(&cascade_reason))
                .await?;
        } else {
            self.hub.emit_trip_update(
                &trip.id,
                trip.status,
                serde_json::json!({
                    "passengerCancelled": user_id,
                    "reason": reason,
                }),
            );
        }

        let mut conn = self.repo.acquire().await?;
        repo::trips::get(&mut conn, &trip.id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))
    }

    /// Coordinator-driven cancel for the search timeout: cancels only
    /// if the trip is still SEARCHING, as a no-op otherwise (the race
    /// against accept and user cancels is expected).
    pub async fn cancel_if_searching(
        &self,
        trip_id: &TripId,
        reason: &str,
    ) -> Result<bool, AppError> {
        let fired;
        {
            let mut tx = self.repo.begin().await?;
            fired = repo::trips::cancel_if_searching(&mut tx, trip_id, reason).await?;
            if fired {
                repo::trips::set_passengers_status(&mut tx, trip_id, TripStatus::Cancelled)
                    .await?;
            }
            tx.commit().await?;
        }

        if fired {
            info!("Trip {} cancelled: {}", trip_id, reason);
            self.hub.emit_trip_update(
                trip_id,
                TripStatus::Cancelled,
                serde_json::json!({ "reason": reason }),
            );
            self.notify_parties(trip_id, TripStatus::Cancelled, Some(reason))
                .await?;
        }

        Ok(fired)
    }

    /// Move trip + passengers to `to` in one unit, then broadcast.
    /// The `from` guard re-checks inside the unit; losing a race
    /// surfaces as InvalidTransition carrying the actual status.
    async fn apply_with_notification(
        &self,
        trip_id: &TripId,
        from: TripStatus,
        to: TripStatus,
        reason: Option<String>,
    ) -> Result<Trip, AppError> {
        let now = repo::now_ms();
        let started_at = (to == TripStatus::InProgress).then_some(now);
        let ended_at = (to == TripStatus::Completed).then_some(now);

        {
            let mut tx = self.repo.begin().await?;

            let moved = repo::trips::advance_status(
                &mut tx,
                trip_id,
                from,
                to,
                reason.as_deref(),
                started_at,
                ended_at,
            )
            .await?;

            if !moved {
                drop(tx);
                let mut conn = self.repo.acquire().await?;
                let current = repo::trips::get(&mut conn, trip_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to,
                });
            }

            repo::trips::set_passengers_status(&mut tx, trip_id, to).await?;
            tx.commit().await?;
        }

        info!("Trip {} moved {} -> {}", trip_id, from, to);

        let mut extra = serde_json::json!({});
        if to == TripStatus::Cancelled {
            extra = serde_json::json!({ "reason": reason });
        }
        self.hub.emit_trip_update(trip_id, to, extra);
        self.notify_parties(trip_id, to, reason.as_deref()).await?;

        let mut conn = self.repo.acquire().await?;
        repo::trips::get(&mut conn, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))
    }

    /// Directed notification to every passenger and the driver.
    async fn notify_parties(
        &self,
        trip_id: &TripId,
        status: TripStatus,
        reason: Option<&str>,
    ) -> Result<(), AppError> {
        let mut conn = self.repo.acquire().await?;

        let passengers: Vec<TripPassenger> = repo::trips::passengers(&mut conn, trip_id).await?;
        let message = status_message(status, reason);

        for passenger in &passengers {
            self.hub.publish_user_event(
                &passenger.passenger_id,
                EventKind::TripNotification,
                serde_json::json!({
                    "tripId": trip_id,
                    "status": status,
                    "message": message,
                }),
            );
        }

        let trip = repo::trips::get(&mut conn, trip_id).await?;
        if let Some(driver_id) = trip.and_then(|t| t.driver_id) {
            if let Some(driver) = repo::drivers::get(&mut conn, &driver_id).await? {
                self.hub.publish_user_event(
                    &driver.user_id,
                    EventKind::TripNotification,
                    serde_json::json!({
                        "tripId": trip_id,
                        "status": status,
                        "message": message,
                    }),
                );
            }
        }

        Ok(())
    }
}

/// Human-readable message for each trip state.
pub fn status_message(status: TripStatus, reason: Option<&str>) -> String {
    match status {
        TripStatus::Searching => "Searching for a driver for your trip...".to_string(),
        TripStatus::Scheduled => "Your trip has been scheduled".to_string(),
        TripStatus::Confirmed => "A driver has accepted your trip".to_string(),
        TripStatus::InProgress => "Your trip has started".to_string(),
        TripStatus::Completed => "Your trip has finished".to_string(),
        TripStatus::Cancelled => match reason {
            Some(r) => format!("Trip cancelled: {}", r),
            None => "Trip cancelled".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_includes_reason() {
        let msg = status_message(TripStatus::Cancelled, Some("no driver available"));
        assert_eq!(msg, "Trip cancelled: no driver available");
    }

    #[test]
    fn test_status_message_without_reason() {
        assert_eq!(status_message(TripStatus::Cancelled, None), "Trip cancelled");
        assert_eq!(
            status_message(TripStatus::Confirmed, None),
            "A driver has accepted your trip"
        );
    }
}
