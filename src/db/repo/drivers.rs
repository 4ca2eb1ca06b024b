use crate::domain::{Driver, DriverId, Location, UserId, Vehicle, VerificationStatus};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub async fn insert(conn: &mut SqliteConnection, driver: &Driver) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO drivers (id, user_id, is_available, verification_status) VALUES (?, ?, ?, ?)",
    )
    .bind(driver.id.as_str())
    .bind(driver.user_id.as_str())
    .bind(driver.is_available)
    .bind(driver.verification_status.as_str())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(
    conn: &mut SqliteConnection,
    id: &DriverId,
) -> Result<Option<Driver>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM drivers WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_driver(&r)))
}

pub async fn get_by_user(
    conn: &mut SqliteConnection,
    user_id: &UserId,
) -> Result<Option<Driver>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM drivers WHERE user_id = ?")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_driver(&r)))
}

pub async fn update_location(
    conn: &mut SqliteConnection,
    id: &DriverId,
    latitude: f64,
    longitude: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE drivers SET current_lat = ?2, current_lon = ?3 WHERE id = ?1")
        .bind(id.as_str())
        .bind(latitude)
        .bind(longitude)
        .execute(conn)
        .await?;

    Ok(())
}

/// Flip availability to false only if currently true. The false return
/// is the losing side of a concurrent acceptance.
pub async fn set_unavailable_if_available(
    conn: &mut SqliteConnection,
    id: &DriverId,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE drivers SET is_available = 0 WHERE id = ? AND is_available = 1")
            .bind(id.as_str())
            .execute(conn)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Unconditional availability set: the external re-enable hook. The
/// core itself never calls this with `true`.
pub async fn set_availability(
    conn: &mut SqliteConnection,
    id: &DriverId,
    available: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE drivers SET is_available = ?2 WHERE id = ?1")
        .bind(id.as_str())
        .bind(available)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_vehicle(
    conn: &mut SqliteConnection,
    vehicle: &Vehicle,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO vehicles (id, driver_id, make, model, color, plate) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(vehicle.driver_id.as_str())
    .bind(&vehicle.make)
    .bind(&vehicle.model)
    .bind(vehicle.color.as_deref())
    .bind(&vehicle.plate)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn vehicle_for(
    conn: &mut SqliteConnection,
    driver_id: &DriverId,
) -> Result<Option<Vehicle>, sqlx::Error> {
    let row = sqlx::query("SELECT driver_id, make, model, color, plate FROM vehicles WHERE driver_id = ?")
        .bind(driver_id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| Vehicle {
        driver_id: DriverId::new(r.get("driver_id")),
        make: r.get("make"),
        model: r.get("model"),
        color: r.get("color"),
        plate: r.get("plate"),
    }))
}

fn map_driver(row: &SqliteRow) -> Driver {
    let current_location = match (
        row.get::<Option<f64>, _>("current_lat"),
        row.get::<Option<f64>, _>("current_lon"),
    ) {
        (Some(latitude), Some(longitude)) => Some(Location {
            latitude,
            longitude,
            address: None,
        }),
        _ => None,
    };

    Driver {
        id: DriverId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        is_available: row.get("is_available"),
        verification_status: VerificationStatus::from_db(
            &row.get::<String, _>("verification_status"),
        ),
        current_location,
    }
}
