//! Persistence layer: pool management and row-family repositories.
//!
//! Every multi-row mutation runs inside one transaction obtained from
//! [`Repository::begin`]; repository functions take a
//! `&mut SqliteConnection` so a unit's reads and writes share that
//! transaction. Conditional `UPDATE ... WHERE <precondition>` plus a
//! `rows_affected` check is the atomic check-and-mutate idiom used
//! throughout.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

/// Handle to the SQLite pool; the entry point for atomic units.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out a connection for plain reads.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
        self.pool.acquire().await
    }

    /// Start an atomic unit. Everything executed on the returned
    /// transaction commits together or not at all.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}

/// True when the error is a unique-constraint violation, used to turn
/// duplicate payments/ratings into Conflict instead of Internal.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.kind() == sqlx::error::ErrorKind::UniqueViolation,
        _ => false,
    }
}
