//! Deterministic in-memory route provider for tests.

use super::{RouteProvider, RouteSummary, RoutingError};
use crate::domain::Location;
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns a fixed route, or a configured failure.
pub struct MockRouteProvider {
    response: Mutex<Result<RouteSummary, RoutingError>>,
}

impl MockRouteProvider {
    /// A 5 km / 12 min route, matching the documented pricing example.
    pub fn new() -> Self {
        Self::with_summary(RouteSummary {
            distance_meters: 5000.0,
            duration_seconds: 720.0,
            geometry: Some("{\"type\":\"LineString\"}".to_string()),
        })
    }

    pub fn with_summary(summary: RouteSummary) -> Self {
        Self {
            response: Mutex::new(Ok(summary)),
        }
    }

    pub fn failing(error: RoutingError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
        }
    }

    pub fn set_response(&self, response: Result<RouteSummary, RoutingError>) {
        if let Ok(mut guard) = self.response.lock() {
            *guard = response;
        }
    }
}

impl Default for MockRouteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteProvider for MockRouteProvider {
    async fn route(
        &self,
        _start: &Location,
        _end: &Location,
    ) -> Result<RouteSummary, RoutingError> {
        match self.response.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Err(RoutingError::NetworkError("mock poisoned".to_string())),
        }
    }
}
