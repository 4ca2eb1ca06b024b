//! Shared fixtures: a wired service stack over a temp database plus
//! row seeding helpers.
#![allow(dead_code)]

use rideline::api::{self, AppState};
use rideline::config::Config;
use rideline::db::{init_db, repo, Repository};
use rideline::dispatch::{Dispatch, TimeoutScheduler};
use rideline::domain::{
    Driver, DriverId, Location, Money, Tariff, TripId, TripStatus, TripType, User, UserId,
    UserRole, Vehicle, VerificationStatus, Wallet, WalletId,
};
use rideline::events::EventHub;
use rideline::lifecycle::{CreateTripRequest, TripCreator, TripLocation, TripRatings, TripUpdater};
use rideline::promotions::Promotions;
use rideline::routing::{MockRouteProvider, RouteProvider};
use rideline::settlement::Settlement;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub repo: Arc<Repository>,
    pub hub: Arc<EventHub>,
    pub route_provider: Arc<MockRouteProvider>,
    pub creator: Arc<TripCreator>,
    pub updater: Arc<TripUpdater>,
    pub dispatch: Arc<Dispatch>,
    pub ratings: Arc<TripRatings>,
    pub location: Arc<TripLocation>,
    pub settlement: Arc<Settlement>,
    pub promotions: Arc<Promotions>,
    pub config: Config,
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        api::create_router(AppState {
            repo: self.repo.clone(),
            config: self.config.clone(),
            hub: self.hub.clone(),
            creator: self.creator.clone(),
            updater: self.updater.clone(),
            dispatch: self.dispatch.clone(),
            ratings: self.ratings.clone(),
            location: self.location.clone(),
            settlement: self.settlement.clone(),
            promotions: self.promotions.clone(),
        })
    }

    pub fn scheduler(&self) -> TimeoutScheduler {
        TimeoutScheduler::new(
            self.repo.clone(),
            self.updater.clone(),
            Duration::from_secs(self.config.timeout_poll_secs),
        )
    }
}

pub async fn setup() -> (TestApp, TempDir) {
    setup_with_timeout(120).await
}

pub async fn setup_with_timeout(search_timeout_secs: u64) -> (TestApp, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let hub = Arc::new(EventHub::new());
    let route_provider = Arc::new(MockRouteProvider::new());
    let provider: Arc<dyn RouteProvider> = route_provider.clone();

    let config = Config {
        port: 0,
        database_path: db_path,
        routing_api_url: "http://example.invalid".to_string(),
        routing_api_key: None,
        search_timeout_secs,
        timeout_poll_secs: 1,
    };

    let creator = Arc::new(TripCreator::new(
        repo.clone(),
        provider,
        hub.clone(),
        search_timeout_secs,
    ));
    let updater = Arc::new(TripUpdater::new(repo.clone(), hub.clone()));
    let dispatch = Arc::new(Dispatch::new(repo.clone(), hub.clone()));
    let ratings = Arc::new(TripRatings::new(repo.clone()));
    let location = Arc::new(TripLocation::new(repo.clone(), hub.clone()));
    let settlement = Arc::new(Settlement::new(repo.clone()));
    let promotions = Arc::new(Promotions::new(repo.clone()));

    (
        TestApp {
            repo,
            hub,
            route_provider,
            creator,
            updater,
            dispatch,
            ratings,
            location,
            settlement,
            promotions,
            config,
        },
        temp_dir,
    )
}

pub fn location(lat: f64, lon: f64, address: Option<&str>) -> Location {
    Location {
        latitude: lat,
        longitude: lon,
        address: address.map(|s| s.to_string()),
    }
}

pub fn on_demand_request() -> CreateTripRequest {
    CreateTripRequest {
        trip_type: TripType::OnDemand,
        start_location: location(-0.18, -78.48, Some("Av. Amazonas 100")),
        end_location: location(-0.20, -78.50, Some("Av. Patria 200")),
        scheduled_at: None,
        available_seats: None,
        price_per_seat: None,
    }
}

pub fn money(s: &str) -> Money {
    Money::from_str_canonical(s).unwrap()
}

pub async fn seed_user(repo: &Repository, role: UserRole) -> UserId {
    let user = User {
        id: UserId::generate(),
        first_name: "Test".to_string(),
        last_name: format!("User-{}", &Uuid::new_v4().to_string()[..8]),
        role,
    };

    let mut conn = repo.acquire().await.unwrap();
    repo::users::insert(&mut conn, &user).await.unwrap();
    user.id
}

pub async fn seed_passenger(repo: &Repository) -> UserId {
    seed_user(repo, UserRole::Passenger).await
}

/// A verified, available driver with a vehicle. Returns (user, driver).
pub async fn seed_driver(repo: &Repository) -> (UserId, DriverId) {
    seed_driver_with(repo, true, VerificationStatus::Verified).await
}

pub async fn seed_driver_with(
    repo: &Repository,
    is_available: bool,
    verification_status: VerificationStatus,
) -> (UserId, DriverId) {
    let user_id = seed_user(repo, UserRole::Driver).await;
    let driver = Driver {
        id: DriverId::generate(),
        user_id: user_id.clone(),
        is_available,
        verification_status,
        current_location: None,
    };

    let mut conn = repo.acquire().await.unwrap();
    repo::drivers::insert(&mut conn, &driver).await.unwrap();
    repo::drivers::insert_vehicle(
        &mut conn,
        &Vehicle {
            driver_id: driver.id.clone(),
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            color: Some("gray".to_string()),
            plate: format!("P-{}", &Uuid::new_v4().to_string()[..8]),
        },
    )
    .await
    .unwrap();

    (user_id, driver.id)
}

pub async fn seed_wallet(repo: &Repository, user_id: &UserId, balance_cents: i64) -> WalletId {
    let wallet = Wallet {
        id: WalletId::generate(),
        user_id: user_id.clone(),
        balance: Money::from_cents(balance_cents),
    };

    let mut conn = repo.acquire().await.unwrap();
    repo::wallets::insert(&mut conn, &wallet).await.unwrap();
    wallet.id
}

/// The tariff from the pricing example: 1.5 base, 0.4/km, 0.15/min,
/// 2.5 minimum. With the mock's 5 km / 12 min route the fare is 5.30.
pub async fn seed_tariff(repo: &Repository) {
    let tariff = Tariff {
        id: Uuid::new_v4().to_string(),
        trip_type: TripType::OnDemand,
        vehicle_category: "STANDARD".to_string(),
        base_price: money("1.5"),
        price_per_km: money("0.4"),
        price_per_minute: money("0.15"),
        minimum_price: money("2.5"),
        surge_multiplier: None,
        is_active: true,
    };

    let mut conn = repo.acquire().await.unwrap();
    repo::tariffs::insert(&mut conn, &tariff).await.unwrap();
}

/// Book an extra passenger onto an existing trip, mirroring its status.
pub async fn add_passenger(repo: &Repository, trip_id: &TripId, status: TripStatus) -> UserId {
    let passenger_id = seed_passenger(repo).await;
    let mut conn = repo.acquire().await.unwrap();
    repo::trips::insert_passenger(
        &mut conn,
        &rideline::domain::TripPassenger {
            trip_id: trip_id.clone(),
            passenger_id: passenger_id.clone(),
            status,
            fare: None,
            booked_seats: None,
            created_at: Utc::now(),
        },
    )
    .await
    .unwrap();
    passenger_id
}

/// Seed passenger + tariff and create a SEARCHING trip.
pub async fn create_searching_trip(app: &TestApp) -> (TripId, UserId) {
    seed_tariff(&app.repo).await;
    let passenger = seed_passenger(&app.repo).await;
    let trip = app
        .creator
        .create(&passenger, on_demand_request())
        .await
        .expect("trip creation failed");
    (trip.id, passenger)
}

/// Drive a freshly created trip through accept -> in progress ->
/// completed. Returns the driver's user id.
pub async fn complete_trip(app: &TestApp, trip_id: &TripId) -> UserId {
    let (driver_user, _driver_id) = seed_driver(&app.repo).await;
    app.dispatch
        .accept(trip_id, &driver_user)
        .await
        .expect("accept failed");
    app.updater
        .advance(trip_id, &driver_user, TripStatus::InProgress, None)
        .await
        .expect("start failed");
    app.updater
        .advance(trip_id, &driver_user, TripStatus::Completed, None)
        .await
        .expect("complete failed");
    driver_user
}

pub async fn get_trip(repo: &Repository, trip_id: &TripId) -> rideline::domain::Trip {
    let mut conn = repo.acquire().await.unwrap();
    repo::trips::get(&mut conn, trip_id)
        .await
        .unwrap()
        .expect("trip missing")
}
