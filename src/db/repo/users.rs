use crate::domain::{User, UserId, UserRole};
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

use super::now_ms;

pub async fn insert(conn: &mut SqliteConnection, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id.as_str())
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role.as_str())
    .bind(now_ms())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: &UserId) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query("SELECT id, first_name, last_name, role FROM users WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| User {
        id: UserId::new(r.get("id")),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        role: UserRole::from_db(&r.get::<String, _>("role")),
    }))
}
