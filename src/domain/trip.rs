//! Trip aggregate: trip row, per-passenger bookings, statuses.

use super::ids::{DriverId, TripId, UserId};
use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of trip being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    OnDemand,
    Intercity,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OnDemand => "ON_DEMAND",
            TripType::Intercity => "INTERCITY",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "INTERCITY" => TripType::Intercity,
            _ => TripType::OnDemand,
        }
    }
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trip lifecycle state. Transitions are validated by the lifecycle
/// module; nothing else may move a trip between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Searching,
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Searching => "SEARCHING",
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Confirmed => "CONFIRMED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "SEARCHING" => TripStatus::Searching,
            "SCHEDULED" => TripStatus::Scheduled,
            "CONFIRMED" => TripStatus::Confirmed,
            "IN_PROGRESS" => TripStatus::InProgress,
            "COMPLETED" => TripStatus::Completed,
            _ => TripStatus::Cancelled,
        }
    }

    /// COMPLETED and CANCELLED admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A geographic point with an optional human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// One ride request from creation to terminal status.
///
/// `fare` and `estimated_fare` are set once at creation and never
/// recomputed; a cancelled trip keeps its row (terminal status, not
/// deletion).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub status: TripStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<DriverId>,
    pub start_location: Location,
    pub end_location: Location,
    pub distance_km: f64,
    pub duration_min: i64,
    pub fare: Money,
    pub estimated_fare: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_geometry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_seat: Option<Money>,
    pub created_at: DateTime<Utc>,
}

/// Join row binding one passenger to one trip.
///
/// Carries its own status so a single passenger can cancel without
/// touching the trip row; the trip cancels once no non-cancelled
/// passengers remain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPassenger {
    pub trip_id: TripId,
    pub passenger_id: UserId,
    pub status: TripStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booked_seats: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_roundtrip() {
        for status in [
            TripStatus::Searching,
            TripStatus::Scheduled,
            TripStatus::Confirmed,
            TripStatus::InProgress,
            TripStatus::Completed,
            TripStatus::Cancelled,
        ] {
            assert_eq!(TripStatus::from_db(status.as_str()), status);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(TripStatus::Completed.is_terminal());
        assert!(TripStatus::Cancelled.is_terminal());
        assert!(!TripStatus::Searching.is_terminal());
        assert!(!TripStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_status_serde_screaming_snake() {
        let json = serde_json::to_string(&TripStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
