//! Wallet and ledger rows. Every balance mutation is paired with
//! exactly one transaction row inside the caller's atomic unit.

use crate::domain::{
    Money, TransactionStatus, TransactionType, UserId, Wallet, WalletId, WalletTransaction,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::ms_to_datetime;

pub async fn insert(conn: &mut SqliteConnection, wallet: &Wallet) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO wallets (id, user_id, balance_cents) VALUES (?, ?, ?)")
        .bind(wallet.id.as_str())
        .bind(wallet.user_id.as_str())
        .bind(wallet.balance.to_cents())
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn get_by_user(
    conn: &mut SqliteConnection,
    user_id: &UserId,
) -> Result<Option<Wallet>, sqlx::Error> {
    let row = sqlx::query("SELECT id, user_id, balance_cents FROM wallets WHERE user_id = ?")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await?;

    Ok(row.map(|r| map_wallet(&r)))
}

/// Debit only when the balance covers the amount; the guard and the
/// mutation are one statement, so a losing concurrent debit simply
/// matches zero rows.
pub async fn debit_if_sufficient(
    conn: &mut SqliteConnection,
    wallet_id: &WalletId,
    amount_cents: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE wallets SET balance_cents = balance_cents - ?2
         WHERE id = ?1 AND balance_cents >= ?2",
    )
    .bind(wallet_id.as_str())
    .bind(amount_cents)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn credit(
    conn: &mut SqliteConnection,
    wallet_id: &WalletId,
    amount_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE wallets SET balance_cents = balance_cents + ?2 WHERE id = ?1")
        .bind(wallet_id.as_str())
        .bind(amount_cents)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn balance_cents(
    conn: &mut SqliteConnection,
    wallet_id: &WalletId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT balance_cents FROM wallets WHERE id = ?")
        .bind(wallet_id.as_str())
        .fetch_one(conn)
        .await
}

pub async fn insert_transaction(
    conn: &mut SqliteConnection,
    tx: &WalletTransaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_transactions
            (id, wallet_id, amount_cents, balance_after_cents, type, status, description, reference_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&tx.id)
    .bind(tx.wallet_id.as_str())
    .bind(tx.amount.to_cents())
    .bind(tx.balance_after.to_cents())
    .bind(tx.tx_type.as_str())
    .bind(tx.status.as_str())
    .bind(tx.description.as_deref())
    .bind(tx.reference_id.as_deref())
    .bind(tx.created_at.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn transactions_for(
    conn: &mut SqliteConnection,
    wallet_id: &WalletId,
    limit: i64,
) -> Result<Vec<WalletTransaction>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, wallet_id, amount_cents, balance_after_cents, type, status, description, reference_id, created_at
         FROM wallet_transactions WHERE wallet_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(wallet_id.as_str())
    .bind(limit)
    .fetch_all(conn)
    .await?;

    Ok(rows.iter().map(map_transaction).collect())
}

/// Sum of the wallet's signed transaction amounts; must always equal
/// the stored balance.
pub async fn sum_amounts_cents(
    conn: &mut SqliteConnection,
    wallet_id: &WalletId,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM wallet_transactions WHERE wallet_id = ?",
    )
    .bind(wallet_id.as_str())
    .fetch_one(conn)
    .await
}

fn map_wallet(row: &SqliteRow) -> Wallet {
    Wallet {
        id: WalletId::new(row.get("id")),
        user_id: UserId::new(row.get("user_id")),
        balance: Money::from_cents(row.get("balance_cents")),
    }
}

fn map_transaction(row: &SqliteRow) -> WalletTransaction {
    WalletTransaction {
        id: row.get("id"),
        wallet_id: WalletId::new(row.get("wallet_id")),
        amount: Money::from_cents(row.get("amount_cents")),
        balance_after: Money::from_cents(row.get("balance_after_cents")),
        tx_type: TransactionType::from_db(&row.get::<String, _>("type")),
        status: TransactionStatus::from_db(&row.get::<String, _>("status")),
        description: row.get("description"),
        reference_id: row.get("reference_id"),
        created_at: ms_to_datetime(row.get("created_at")),
    }
}
