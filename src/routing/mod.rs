//! Routing provider collaborator: distance/duration/geometry for a
//! coordinate pair. Failures surface as trip-creation rejections; the
//! core never retries beyond the client's transient backoff.

use crate::domain::Location;
use async_trait::async_trait;
use std::fmt;

pub mod mock;
pub mod ors;

pub use mock::MockRouteProvider;
pub use ors::OrsRouteProvider;

/// Route metrics between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// Provider geometry, stored verbatim on the trip.
    pub geometry: Option<String>,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Duration in whole minutes, rounded to nearest.
    pub fn duration_min(&self) -> i64 {
        (self.duration_seconds / 60.0).round() as i64
    }
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Compute a route from start to end.
    async fn route(&self, start: &Location, end: &Location) -> Result<RouteSummary, RoutingError>;
}

#[derive(Debug, Clone)]
pub enum RoutingError {
    /// Network error (connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error from the provider
    HttpError { status: u16, message: String },
    /// Malformed response or no route between the points
    NoRoute(String),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RoutingError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            RoutingError::NoRoute(msg) => write!(f, "No route: {}", msg),
        }
    }
}

impl std::error::Error for RoutingError {}
