use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{Money, UserId, Wallet, WalletTransaction};
use crate::error::AppError;

pub async fn get_wallet(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Wallet>, AppError> {
    let wallet = state.settlement.wallet(&UserId::new(user_id)).await?;
    Ok(Json(wallet))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
}

pub async fn get_transactions(
    Path(user_id): Path<String>,
    Query(params): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    let limit = params.limit.unwrap_or(10);
    let transactions = state
        .settlement
        .transactions(&UserId::new(user_id), limit)
        .await?;
    Ok(Json(transactions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementBody {
    pub amount: Money,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub wallet: Wallet,
    pub transaction: WalletTransaction,
}

pub async fn deposit(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<MovementBody>,
) -> Result<Json<MovementResponse>, AppError> {
    let (wallet, transaction) = state
        .settlement
        .deposit(&UserId::new(user_id), body.amount, body.description)
        .await?;
    Ok(Json(MovementResponse {
        wallet,
        transaction,
    }))
}

pub async fn withdraw(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<MovementBody>,
) -> Result<Json<MovementResponse>, AppError> {
    let (wallet, transaction) = state
        .settlement
        .withdraw(&UserId::new(user_id), body.amount, body.description)
        .await?;
    Ok(Json(MovementResponse {
        wallet,
        transaction,
    }))
}
