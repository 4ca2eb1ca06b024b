//! Promotional code records and application results.

use super::money::Money;
use super::trip::TripType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Promo code row. `current_uses` only moves forward, guarded against
/// `usage_limit` inside the application's atomic unit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<Money>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<i64>,
    pub current_uses: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_trip_amount: Option<Money>,
    pub applicable_trip_types: Vec<TripType>,
}

/// Summary of the applied code returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoSummary {
    pub id: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of applying a promo code to an amount.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoApplication {
    pub original_amount: Money,
    pub discount: Money,
    pub final_amount: Money,
    pub promo_code: PromoSummary,
}
