//! OpenRouteService client.

use super::{RouteProvider, RouteSummary, RoutingError};
use crate::domain::Location;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Routing provider backed by the OpenRouteService directions API.
#[derive(Debug, Clone)]
pub struct OrsRouteProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OrsRouteProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post_directions(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, RoutingError> {
        let url = format!("{}/v2/directions/driving-car/geojson", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(backoff, || async {
            let mut request = self.client.post(&url).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.header("Authorization", key);
            }

            let response = request.send().await.map_err(|e| {
                backoff::Error::transient(RoutingError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status.is_server_error() {
                return Err(backoff::Error::transient(RoutingError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(RoutingError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(RoutingError::NoRoute(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl RouteProvider for OrsRouteProvider {
    async fn route(&self, start: &Location, end: &Location) -> Result<RouteSummary, RoutingError> {
        debug!(
            "Routing ({}, {}) -> ({}, {})",
            start.latitude, start.longitude, end.latitude, end.longitude
        );

        // ORS expects [lon, lat] pairs
        let payload = serde_json::json!({
            "coordinates": [
                [start.longitude, start.latitude],
                [end.longitude, end.latitude],
            ],
        });

        let response = self.post_directions(payload).await?;
        parse_geojson_summary(&response)
    }
}

/// Pull distance/duration/geometry out of a directions GeoJSON body.
fn parse_geojson_summary(response: &serde_json::Value) -> Result<RouteSummary, RoutingError> {
    let feature = response
        .get("features")
        .and_then(|f| f.as_array())
        .and_then(|f| f.first())
        .ok_or_else(|| RoutingError::NoRoute("no route between these locations".to_string()))?;

    let summary = feature
        .get("properties")
        .and_then(|p| p.get("summary"))
        .ok_or_else(|| RoutingError::NoRoute("response missing route summary".to_string()))?;

    let distance_meters = summary
        .get("distance")
        .and_then(|d| d.as_f64())
        .ok_or_else(|| RoutingError::NoRoute("response missing distance".to_string()))?;

    let duration_seconds = summary
        .get("duration")
        .and_then(|d| d.as_f64())
        .ok_or_else(|| RoutingError::NoRoute("response missing duration".to_string()))?;

    let geometry = feature.get("geometry").map(|g| g.to_string());

    Ok(RouteSummary {
        distance_meters,
        duration_seconds,
        geometry,
    })
}
