use crate::domain::{Money, Payment, PaymentMethod, PaymentStatus, TripId, UserId};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::ms_to_datetime;

/// Insert the settlement record. The UNIQUE constraint on trip_id makes
/// a concurrent duplicate surface as a unique violation.
pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payments
            (id, trip_id, user_id, amount_cents, method, status,
             platform_fee_cents, driver_amount_cents, tax_amount_cents, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.id)
    .bind(payment.trip_id.as_str())
    .bind(payment.user_id.as_str())
    .bind(payment.amount.to_cents())
    .bind(payment.method.as_str())
    .bind(payment.status.as_str())
    .bind(payment.platform_fee.to_cents())
    .bind(payment.driver_amount.to_cents())
    .bind(payment.tax_amount.to_cents())
    .bind(payment.created_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get_by_trip(
    conn: &mut SqliteConnection,
    trip_id: &TripId,
) -> Result<Option<Payment>, sqlx::Error> {
    let row = sqlx::query("SELECT * FROM payments WHERE trip_id = ?")
        .bind(trip_id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_payment(&r)))
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    payment_id: &str,
    status: PaymentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET status = ?2 WHERE id = ?1")
        .bind(payment_id)
        .bind(status.as_str())
        .execute(conn)
        .await?;

    Ok(())
}

fn map_payment(row: &SqliteRow) -> Payment {
    Payment {
        id: row.get("id"),
        trip_id: TripId::new(row.get("trip_id")),
        user_id: UserId::new(row.get("user_id")),
        amount: Money::from_cents(row.get("amount_cents")),
        method: PaymentMethod::from_db(&row.get::<String, _>("method")),
        status: PaymentStatus::from_db(&row.get::<String, _>("status")),
        platform_fee: Money::from_cents(row.get("platform_fee_cents")),
        driver_amount: Money::from_cents(row.get("driver_amount_cents")),
        tax_amount: Money::from_cents(row.get("tax_amount_cents")),
        created_at: ms_to_datetime(row.get("created_at")),
    }
}
