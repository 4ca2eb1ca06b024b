pub mod api;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod promotions;
pub mod routing;
pub mod settlement;

pub use config::Config;
pub use db::{init_db, Repository};
pub use dispatch::{Dispatch, TimeoutScheduler};
pub use domain::{
    Driver, DriverId, Location, Money, Payment, PaymentMethod, Trip, TripId, TripPassenger,
    TripStatus, TripType, UserId, Wallet, WalletId,
};
pub use error::AppError;
pub use events::{EventHub, EventKind, SessionId};
pub use lifecycle::{CreateTripRequest, TripCreator, TripLocation, TripRatings, TripUpdater};
pub use promotions::Promotions;
pub use routing::{MockRouteProvider, OrsRouteProvider, RouteProvider, RouteSummary, RoutingError};
pub use settlement::Settlement;
