pub mod drivers;
pub mod health;
pub mod payments;
pub mod promos;
pub mod trips;
pub mod wallets;

use crate::config::Config;
use crate::db::Repository;
use crate::dispatch::Dispatch;
use crate::events::EventHub;
use crate::lifecycle::{TripCreator, TripLocation, TripRatings, TripUpdater};
use crate::promotions::Promotions;
use crate::settlement::Settlement;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub hub: Arc<EventHub>,
    pub creator: Arc<TripCreator>,
    pub updater: Arc<TripUpdater>,
    pub dispatch: Arc<Dispatch>,
    pub ratings: Arc<TripRatings>,
    pub location: Arc<TripLocation>,
    pub settlement: Arc<Settlement>,
    pub promotions: Arc<Promotions>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/trips", post(trips::create_trip))
        .route("/v1/trips/:id", get(trips::get_trip).patch(trips::update_trip))
        .route("/v1/trips/:id/accept", post(trips::accept_trip))
        .route("/v1/trips/:id/location", post(trips::update_location))
        .route("/v1/trips/:id/ratings", post(trips::rate_trip))
        .route("/v1/payments", post(payments::settle))
        .route("/v1/payments/trip/:trip_id", get(payments::get_by_trip))
        .route("/v1/wallets/:user_id", get(wallets::get_wallet))
        .route(
            "/v1/wallets/:user_id/transactions",
            get(wallets::get_transactions),
        )
        .route("/v1/wallets/:user_id/deposit", post(wallets::deposit))
        .route("/v1/wallets/:user_id/withdraw", post(wallets::withdraw))
        .route("/v1/promos/apply", post(promos::apply))
        .route(
            "/v1/drivers/:id/availability",
            put(drivers::set_availability),
        )
        .layer(cors)
        .with_state(state)
}
