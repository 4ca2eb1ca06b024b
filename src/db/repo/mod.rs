//! Row-family repositories. Functions take a `&mut SqliteConnection`
//! so callers decide the transaction scope.

pub mod drivers;
pub mod payments;
pub mod promos;
pub mod ratings;
pub mod tariffs;
pub mod timeouts;
pub mod trips;
pub mod users;
pub mod wallets;

use chrono::{DateTime, Utc};

/// Milliseconds since epoch for `Utc::now()`, the storage form of all
/// timestamps.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
