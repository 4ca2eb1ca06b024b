//! Trip and trip-passenger rows. The conditional updates here are the
//! state machine's atomic check-and-mutate primitives.

use crate::domain::{DriverId, Location, Money, Trip, TripId, TripPassenger, TripStatus, TripType, UserId};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::ms_to_datetime;

pub async fn insert(conn: &mut SqliteConnection, trip: &Trip) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO trips (
            id, type, status, driver_id,
            start_lat, start_lon, start_address,
            end_lat, end_lon, end_address,
            distance_km, duration_min, fare_cents, estimated_fare_cents,
            route_geometry, scheduled_at, started_at, ended_at,
            cancellation_reason, origin, destination,
            available_seats, price_per_seat_cents, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(trip.id.as_str())
    .bind(trip.trip_type.as_str())
    .bind(trip.status.as_str())
    .bind(trip.driver_id.as_ref().map(|d| d.as_str().to_string()))
    .bind(trip.start_location.latitude)
    .bind(trip.start_location.longitude)
    .bind(trip.start_location.address.as_deref())
    .bind(trip.end_location.latitude)
    .bind(trip.end_location.longitude)
    .bind(trip.end_location.address.as_deref())
    .bind(trip.distance_km)
    .bind(trip.duration_min)
    .bind(trip.fare.to_cents())
    .bind(trip.estimated_fare.to_cents())
    .bind(trip.route_geometry.as_deref())
    .bind(trip.scheduled_at.map(|t| t.timestamp_millis()))
    .bind(trip.started_at.map(|t| t.timestamp_millis()))
    .bind(trip.ended_at.map(|t| t.timestamp_millis()))
    .bind(trip.cancellation_reason.as_deref())
    .bind(trip.origin.as_deref())
    .bind(trip.destination.as_deref())
    .bind(trip.available_seats)
    .bind(trip.price_per_seat.map(|m| m.to_cents()))
    .bind(trip.created_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn insert_passenger(
    conn: &mut SqliteConnection,
    passenger: &TripPassenger,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO trip_passengers (trip_id, passenger_id, status, fare_cents, booked_seats, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(passenger.trip_id.as_str())
    .bind(passenger.passenger_id.as_str())
    .bind(passenger.status.as_str())
    .bind(passenger.fare.map(|m| m.to_cents()))
    .bind(passenger.booked_seats)
    .bind(passenger.created_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &TripId) -> Result<Option<Trip>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM trips WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_trip(&r)))
}

pub async fn passengers(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
) -> Result<Vec<TripPassenger>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT trip_id, passenger_id, status, fare_cents, booked_seats, created_at
         FROM trip_passengers WHERE trip_id = ? ORDER BY created_at ASC",
    )
    .bind(trip_id.as_str())
    .fetch_all(conn)
    .await?;

    Ok(rows.iter().map(map_passenger).collect())
}

/// Drive the trip row from one status to another, stamping timestamps
/// where given. The `from` guard is the check half of the atomic
/// check-and-mutate: a false return means some concurrent transition
/// moved the trip first.
pub async fn advance_status(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    from: TripStatus,
    to: TripStatus,
    reason: Option<&str>,
    started_at: Option<i64>,
    ended_at: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE trips SET
            status = ?3,
            cancellation_reason = COALESCE(?4, cancellation_reason),
            started_at = COALESCE(?5, started_at),
            ended_at = COALESCE(?6, ended_at)
        WHERE id = ?1 AND status = ?2
        "#,
    )
    .bind(trip_id.as_str())
    .bind(from.as_str())
    .bind(to.as_str())
    .bind(reason)
    .bind(started_at)
    .bind(ended_at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cancel the trip row unless it already reached a terminal status.
/// Used by the cascading cancel once no active passengers remain.
pub async fn cancel_if_active(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    reason: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE trips SET status = 'CANCELLED', cancellation_reason = ?2
         WHERE id = ?1 AND status NOT IN ('COMPLETED', 'CANCELLED')",
    )
    .bind(trip_id.as_str())
    .bind(reason)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Claim a SEARCHING trip for an accepting driver.
///
/// Every dispatch precondition sits in this one statement's guard
/// (trip SEARCHING, driver present, available and verified), so the
/// check and the mutation cannot be separated by a concurrent accept.
/// Issue this as the first write of the accept unit; a false return is
/// the losing side of the race (or a failed precondition), diagnosed
/// by reads afterwards.
pub async fn claim_for_driver(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    driver_user_id: &UserId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE trips SET
            driver_id = (SELECT id FROM drivers WHERE user_id = ?2),
            status = 'CONFIRMED'
        WHERE id = ?1 AND status = 'SEARCHING'
          AND EXISTS (
              SELECT 1 FROM drivers
              WHERE user_id = ?2 AND is_available = 1 AND verification_status = 'VERIFIED'
          )
        "#,
    )
    .bind(trip_id.as_str())
    .bind(driver_user_id.as_str())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cancel only if still SEARCHING. Returns false when some transition
/// won the race first; callers treat that as a no-op.
pub async fn cancel_if_searching(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    reason: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE trips SET status = 'CANCELLED', cancellation_reason = ?2
         WHERE id = ?1 AND status = 'SEARCHING'",
    )
    .bind(trip_id.as_str())
    .bind(reason)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_passengers_status(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    status: TripStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE trip_passengers SET status = ?2 WHERE trip_id = ?1")
        .bind(trip_id.as_str())
        .bind(status.as_str())
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn set_passenger_status(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    passenger_id: &UserId,
    status: TripStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE trip_passengers SET status = ?3 WHERE trip_id = ?1 AND passenger_id = ?2",
    )
    .bind(trip_id.as_str())
    .bind(passenger_id.as_str())
    .bind(status.as_str())
    .execute(conn)
    .await?;

    Ok(())
}

/// Passengers still holding a non-cancelled booking on this trip.
pub async fn count_active_passengers(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM trip_passengers WHERE trip_id = ? AND status != 'CANCELLED'",
    )
    .bind(trip_id.as_str())
    .fetch_one(conn)
    .await
}

/// True when the user is the trip's driver or one of its passengers.
pub async fn is_party(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
    user_id: &UserId,
) -> Result<bool, sqlx::Error> {
    let result: i64 = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM trip_passengers WHERE trip_id = ?1 AND passenger_id = ?2
        ) OR EXISTS(
            SELECT 1 FROM trips t JOIN drivers d ON d.id = t.driver_id
            WHERE t.id = ?1 AND d.user_id = ?2
        )
        "#,
    )
    .bind(trip_id.as_str())
    .bind(user_id.as_str())
    .fetch_one(conn)
    .await?;

    Ok(result != 0)
}

fn map_trip(row: &SqliteRow) -> Trip {
    Trip {
        id: TripId::new(row.get("id")),
        trip_type: TripType::from_db(&row.get::<String, _>("type")),
        status: TripStatus::from_db(&row.get::<String, _>("status")),
        driver_id: row
            .get::<Option<String>, _>("driver_id")
            .map(DriverId::new),
        start_location: Location {
            latitude: row.get("start_lat"),
            longitude: row.get("start_lon"),
            address: row.get("start_address"),
        },
        end_location: Location {
            latitude: row.get("end_lat"),
            longitude: row.get("end_lon"),
            address: row.get("end_address"),
        },
        distance_km: row.get("distance_km"),
        duration_min: row.get("duration_min"),
        fare: Money::from_cents(row.get("fare_cents")),
        estimated_fare: Money::from_cents(row.get("estimated_fare_cents")),
        route_geometry: row.get("route_geometry"),
        scheduled_at: row.get::<Option<i64>, _>("scheduled_at").map(ms_to_datetime),
        started_at: row.get::<Option<i64>, _>("started_at").map(ms_to_datetime),
        ended_at: row.get::<Option<i64>, _>("ended_at").map(ms_to_datetime),
        cancellation_reason: row.get("cancellation_reason"),
        origin: row.get("origin"),
        destination: row.get("destination"),
        available_seats: row.get("available_seats"),
        price_per_seat: row
            .get::<Option<i64>, _>("price_per_seat_cents")
            .map(Money::from_cents),
        created_at: ms_to_datetime(row.get("created_at")),
    }
}

fn map_passenger(row: &SqliteRow) -> TripPassenger {
    TripPassenger {
        trip_id: TripId::new(row.get("trip_id")),
        passenger_id: UserId::new(row.get("passenger_id")),
        status: TripStatus::from_db(&row.get::<String, _>("status")),
        fare: row
            .get::<Option<i64>, _>("fare_cents")
            .map(Money::from_cents),
        booked_seats: row.get("booked_seats"),
        created_at: ms_to_datetime(row.get("created_at")),
    }
}
