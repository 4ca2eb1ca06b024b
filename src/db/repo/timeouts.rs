//! Durable search-timeout rows. Arming happens inside the trip-creation
//! unit; a separate scheduler loop fires due rows.

use crate::domain::{TripId, UserId};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

pub async fn arm(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    requested_by: &UserId,
    deadline_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR REPLACE INTO search_timeouts (trip_id, requested_by, deadline) VALUES (?, ?, ?)",
    )
    .bind(trip_id.as_str())
    .bind(requested_by.as_str())
    .bind(deadline_ms)
    .execute(conn)
    .await?;

    Ok(())
}

/// Timeouts whose deadline has passed, oldest first.
pub async fn due(
    conn: &mut SqliteConnection,
    now_ms: i64,
) -> Result<Vec<(TripId, UserId)>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT trip_id, requested_by FROM search_timeouts WHERE deadline <= ? ORDER BY deadline ASC",
    )
    .bind(now_ms)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .iter()
        .map(|r| {
            (
                TripId::new(r.get("trip_id")),
                UserId::new(r.get("requested_by")),
            )
        })
        .collect())
}

pub async fn clear(conn: &mut SqliteConnection, trip_id: &TripId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM search_timeouts WHERE trip_id = ?")
        .bind(trip_id.as_str())
        .execute(conn)
        .await?;

    Ok(())
}
