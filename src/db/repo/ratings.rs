use crate::domain::{Rating, UserId};
use sqlx::sqlite::SqliteConnection;

/// Insert a rating. The UNIQUE (trip, from, to) constraint rejects a
/// second rating in the same direction.
pub async fn insert(conn: &mut SqliteConnection, rating: &Rating) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ratings (id, trip_id, from_user_id, to_user_id, score, comment, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&rating.id)
    .bind(rating.trip_id.as_str())
    .bind(rating.from_user_id.as_str())
    .bind(rating.to_user_id.as_str())
    .bind(rating.score)
    .bind(rating.comment.as_deref())
    .bind(rating.created_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

/// Average score received by a user across all trips, if any.
pub async fn average_for(
    conn: &mut SqliteConnection,
    user_id: &UserId,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT AVG(score) FROM ratings WHERE to_user_id = ?")
        .bind(user_id.as_str())
        .fetch_one(conn)
        .await
}
