use crate::domain::{Money, Tariff, TripType};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

pub async fn insert(conn: &mut SqliteConnection, tariff: &Tariff) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tariffs
            (id, trip_type, vehicle_category, base_price_cents, price_per_km_cents,
             price_per_minute_cents, minimum_price_cents, surge_multiplier, is_active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&tariff.id)
    .bind(tariff.trip_type.as_str())
    .bind(&tariff.vehicle_category)
    .bind(tariff.base_price.to_cents())
    .bind(tariff.price_per_km.to_cents())
    .bind(tariff.price_per_minute.to_cents())
    .bind(tariff.minimum_price.to_cents())
    .bind(tariff.surge_multiplier.map(|m| m.to_canonical_string()))
    .bind(tariff.is_active)
    .execute(conn)
    .await?;

    Ok(())
}

/// The active tariff for a trip type and vehicle category, if one is
/// configured.
pub async fn active_for(
    conn: &mut SqliteConnection,
    trip_type: TripType,
    vehicle_category: &str,
) -> Result<Option<Tariff>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT * FROM tariffs WHERE is_active = 1 AND trip_type = ? AND vehicle_category = ? LIMIT 1",
    )
    .bind(trip_type.as_str())
    .bind(vehicle_category)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(|r| map_tariff(&r)))
}

fn map_tariff(row: &SqliteRow) -> Tariff {
    Tariff {
        id: row.get("id"),
        trip_type: TripType::from_db(&row.get::<String, _>("trip_type")),
        vehicle_category: row.get("vehicle_category"),
        base_price: Money::from_cents(row.get("base_price_cents")),
        price_per_km: Money::from_cents(row.get("price_per_km_cents")),
        price_per_minute: Money::from_cents(row.get("price_per_minute_cents")),
        minimum_price: Money::from_cents(row.get("minimum_price_cents")),
        surge_multiplier: row
            .get::<Option<String>, _>("surge_multiplier")
            .and_then(|s| Money::from_str_canonical(&s).ok()),
        is_active: row.get("is_active"),
    }
}
