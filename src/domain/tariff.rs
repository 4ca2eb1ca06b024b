//! Tariff configuration used to price on-demand trips.

use super::money::Money;
use super::trip::TripType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    pub id: String,
    pub trip_type: TripType,
    pub vehicle_category: String,
    pub base_price: Money,
    pub price_per_km: Money,
    pub price_per_minute: Money,
    pub minimum_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surge_multiplier: Option<Money>,
    pub is_active: bool,
}
