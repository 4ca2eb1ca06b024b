use crate::domain::{Money, PromoCode, TripType};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::ms_to_datetime;

pub async fn insert(conn: &mut SqliteConnection, promo: &PromoCode) -> Result<(), sqlx::Error> {
    let trip_types =
        serde_json::to_string(&promo.applicable_trip_types).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        r#"
        INSERT INTO promo_codes
            (id, code, description, discount_amount_cents, discount_percent, max_discount_cents,
             start_date, end_date, is_active, usage_limit, current_uses, min_trip_amount_cents,
             applicable_trip_types)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&promo.id)
    .bind(&promo.code)
    .bind(promo.description.as_deref())
    .bind(promo.discount_amount.map(|m| m.to_cents()))
    .bind(promo.discount_percent.map(|m| m.to_canonical_string()))
    .bind(promo.max_discount.map(|m| m.to_cents()))
    .bind(promo.start_date.timestamp_millis())
    .bind(promo.end_date.timestamp_millis())
    .bind(promo.is_active)
    .bind(promo.usage_limit)
    .bind(promo.current_uses)
    .bind(promo.min_trip_amount.map(|m| m.to_cents()))
    .bind(trip_types)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<PromoCode>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM promo_codes WHERE code = ?")
        .bind(code)
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_promo(&r)))
}

/// Count one use, guarded against the usage limit in the same
/// statement. A false return means the limit was reached by a
/// concurrent application.
pub async fn increment_usage_guarded(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE promo_codes SET current_uses = current_uses + 1
         WHERE id = ?1 AND is_active = 1
           AND (usage_limit IS NULL OR current_uses < usage_limit)",
    )
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn map_promo(row: &SqliteRow) -> PromoCode {
    let trip_types: Vec<TripType> =
        serde_json::from_str(&row.get::<String, _>("applicable_trip_types")).unwrap_or_default();

    PromoCode {
        id: row.get("id"),
        code: row.get("code"),
        description: row.get("description"),
        discount_amount: row
            .get::<Option<i64>, _>("discount_amount_cents")
            .map(Money::from_cents),
        discount_percent: row
            .get::<Option<String>, _>("discount_percent")
            .and_then(|s| Money::from_str_canonical(&s).ok()),
        max_discount: row
            .get::<Option<i64>, _>("max_discount_cents")
            .map(Money::from_cents),
        start_date: ms_to_datetime(row.get("start_date")),
        end_date: ms_to_datetime(row.get("end_date")),
        is_active: row.get("is_active"),
        usage_limit: row.get("usage_limit"),
        current_uses: row.get("current_uses"),
        min_trip_amount: row
            .get::<Option<i64>, _>("min_trip_amount_cents")
            .map(Money::from_cents),
        applicable_trip_types: trip_types,
    }
}
