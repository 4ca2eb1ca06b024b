//! Trip creation: price the request, persist trip + creator booking in
//! one unit, announce it, and arm the search deadline.

use crate::config::DEFAULT_VEHICLE_CATEGORY;
use crate::db::{repo, Repository};
use crate::domain::{
    Location, Money, Trip, TripId, TripPassenger, TripStatus, TripType, UserId, UserRole,
};
use crate::engine;
use crate::error::AppError;
use crate::events::EventHub;
use crate::routing::RouteProvider;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub start_location: Location,
    pub end_location: Location,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub available_seats: Option<i64>,
    pub price_per_seat: Option<Money>,
}

pub struct TripCreator {
    repo: Arc<Repository>,
    router: Arc<dyn RouteProvider>,
    hub: Arc<EventHub>,
    search_timeout_secs: u64,
}

impl TripCreator {
    pub fn new(
        repo: Arc<Repository>,
        router: Arc<dyn RouteProvider>,
        hub: Arc<EventHub>,
        search_timeout_secs: u64,
    ) -> Self {
        Self {
            repo,
            router,
            hub,
            search_timeout_secs,
        }
    }

    pub async fn create(
        &self,
        user_id: &UserId,
        request: CreateTripRequest,
    ) -> Result<Trip, AppError> {
        {
            let mut conn = self.repo.acquire().await?;
            let user = repo::users::get(&mut conn, user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

            if user.role != UserRole::Passenger {
                return Err(AppError::Forbidden(
                    "only passengers can request trips".to_string(),
                ));
            }
        }

        // Routing happens before the atomic unit begins; a failure here
        // rejects the creation outright.
        let route = self
            .router
            .route(&request.start_location, &request.end_location)
            .await
            .map_err(|e| AppError::Upstream(format!("failed to compute route: {}", e)))?;

        let distance_km = route.distance_km();
        let duration_min = route.duration_min();

        let (fare, passenger_fare, booked_seats) = match request.trip_type {
            TripType::OnDemand => {
                let mut conn = self.repo.acquire().await?;
                let tariff = repo::tariffs::active_for(
                    &mut conn,
                    TripType::OnDemand,
                    DEFAULT_VEHICLE_CATEGORY,
                )
                .await?
                .ok_or_else(|| {
                    AppError::Upstream("no active tariff configured for this trip type".to_string())
                })?;

                let fare = engine::price(distance_km, duration_min, &tariff);
                (fare, fare, None)
            }
            TripType::Intercity => {
                let price_per_seat = request.price_per_seat.ok_or_else(|| {
                    AppError::Validation(
                        "price per seat is required for intercity trips".to_string(),
                    )
                })?;
                let seats = request.available_seats.unwrap_or(1);
                let fare = engine::intercity_price(price_per_seat, seats);
                (fare, price_per_seat, Some(1))
            }
        };

        let status = match request.trip_type {
            TripType::OnDemand => TripStatus::Searching,
            TripType::Intercity => TripStatus::Scheduled,
        };

        let now = Utc::now();
        let trip = Trip {
            id: TripId::generate(),
            trip_type: request.trip_type,
            status,
            driver_id: None,
            origin: request.start_location.address.clone(),
            destination: request.end_location.address.clone(),
            start_location: request.start_location,
            end_location: request.end_location,
            distance_km,
            duration_min,
            fare,
            estimated_fare: fare,
            route_geometry: route.geometry,
            scheduled_at: request.scheduled_at,
            started_at: None,
            ended_at: None,
            cancellation_reason: None,
            available_seats: request.available_seats,
            price_per_seat: request.price_per_seat,
            created_at: now,
        };

        let booking = TripPassenger {
            trip_id: trip.id.clone(),
            passenger_id: user_id.clone(),
            status,
            fare: Some(passenger_fare),
            booked_seats,
            created_at: now,
        };

        {
            let mut tx = self.repo.begin().await?;
            repo::trips::insert(&mut tx, &trip).await?;
            repo::trips::insert_passenger(&mut tx, &booking).await?;

            if status == TripStatus::Searching {
                let deadline = now.timestamp_millis() + (self.search_timeout_secs as i64) * 1000;
                repo::timeouts::arm(&mut tx, &trip.id, user_id, deadline).await?;
            }

            tx.commit().await?;
        }

        info!(
            "Trip {} created ({}, {}) fare {}",
            trip.id, trip.trip_type, trip.status, trip.fare
        );

        self.hub.emit_trip_update(
            &trip.id,
            trip.status,
            serde_json::json!({
                "trip": {
                    "id": trip.id,
                    "type": trip.trip_type,
                    "status": trip.status,
                    "distance": trip.distance_km,
                    "duration": trip.duration_min,
                    "estimatedFare": trip.estimated_fare,
                    "startLocation": trip.start_location,
                    "endLocation": trip.end_location,
                    "createdAt": trip.created_at,
                }
            }),
        );

        Ok(trip)
    }
}
