//! Settlement ledger: trip payments and wallet movements.
//!
//! Every balance mutation pairs with exactly one transaction row inside
//! the same atomic unit, so a wallet's balance always equals the sum of
//! its transaction amounts. Settling a trip is all-or-nothing: payment
//! row, payer debit and driver credit commit together or not at all.

use crate::db::{is_unique_violation, repo, Repository};
use crate::domain::{
    Money, Payment, PaymentMethod, PaymentStatus, TransactionStatus, TransactionType, TripId,
    TripStatus, UserId, Wallet, WalletTransaction,
};
use crate::error::AppError;
use chrono::Utc;
use rust_decimal::Decimal as RustDecimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Platform commission: 20% of the fare.
fn platform_fee_rate() -> Money {
    Money::new(RustDecimal::new(20, 2))
}

/// Informational tax rate: 12%, never subtracted from the driver share.
fn tax_rate() -> Money {
    Money::new(RustDecimal::new(12, 2))
}

pub struct Settlement {
    repo: Arc<Repository>,
}

impl Settlement {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Settle a completed trip: split fees, create the payment, and for
    /// wallet payments move funds from payer to driver.
    pub async fn settle(
        &self,
        trip_id: &TripId,
        payer_id: &UserId,
        method: PaymentMethod,
    ) -> Result<Payment, AppError> {
        let mut tx = self.repo.begin().await?;

        let trip = repo::trips::get(&mut tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;

        if trip.status != TripStatus::Completed {
            return Err(AppError::Conflict(format!(
                "cannot settle trip in status {}, settlement requires COMPLETED",
                trip.status
            )));
        }

        let passengers = repo::trips::passengers(&mut tx, trip_id).await?;
        if !passengers.iter().any(|p| p.passenger_id == *payer_id) {
            return Err(AppError::Forbidden(
                "user is not a passenger of this trip".to_string(),
            ));
        }

        if repo::payments::get_by_trip(&mut tx, trip_id).await?.is_some() {
            return Err(AppError::Conflict(
                "this trip has already been paid".to_string(),
            ));
        }

        let amount = trip.fare;
        let platform_fee = (amount * platform_fee_rate()).round2();
        let driver_amount = amount - platform_fee;
        let tax_amount = (amount * tax_rate()).round2();

        let mut payment = Payment {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.clone(),
            user_id: payer_id.clone(),
            amount,
            method,
            status: if method == PaymentMethod::Cash {
                PaymentStatus::Completed
            } else {
                PaymentStatus::Pending
            },
            platform_fee,
            driver_amount,
            tax_amount,
            created_at: Utc::now(),
        };

        match repo::payments::insert(&mut tx, &payment).await {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "this trip has already been paid".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        if method == PaymentMethod::Wallet {
            let wallet = repo::wallets::get_by_user(&mut tx, payer_id)
                .await?
                .ok_or_else(|| AppError::NotFound("wallet not found".to_string()))?;

            let debited =
                repo::wallets::debit_if_sufficient(&mut tx, &wallet.id, amount.to_cents()).await?;
            if !debited {
                // Dropping the transaction rolls the payment row back.
                return Err(AppError::InsufficientFunds {
                    balance: wallet.balance,
                    required: amount,
                });
            }

            let balance_after =
                Money::from_cents(repo::wallets::balance_cents(&mut tx, &wallet.id).await?);
            repo::wallets::insert_transaction(
                &mut tx,
                &WalletTransaction {
                    id: Uuid::new_v4().to_string(),
                    wallet_id: wallet.id.clone(),
                    amount: -amount,
                    balance_after,
                    tx_type: TransactionType::Payment,
                    status: TransactionStatus::Completed,
                    description: Some(format!("Payment for trip {}", trip_id)),
                    reference_id: Some(payment.id.clone()),
                    created_at: Utc::now(),
                },
            )
            .await?;

            repo::payments::set_status(&mut tx, &payment.id, PaymentStatus::Completed).await?;
            payment.status = PaymentStatus::Completed;

            if let Some(driver_id) = &trip.driver_id {
                if let Some(driver) = repo::drivers::get(&mut tx, driver_id).await? {
                    if let Some(driver_wallet) =
                        repo::wallets::get_by_user(&mut tx, &driver.user_id).await?
                    {
                        repo::wallets::credit(&mut tx, &driver_wallet.id, driver_amount.to_cents())
                            .await?;
                        let balance_after = Money::from_cents(
                            repo::wallets::balance_cents(&mut tx, &driver_wallet.id).await?,
                        );
                        repo::wallets::insert_transaction(
                            &mut tx,
                            &WalletTransaction {
                                id: Uuid::new_v4().to_string(),
                                wallet_id: driver_wallet.id.clone(),
                                amount: driver_amount,
                                balance_after,
                                tx_type: TransactionType::TripEarning,
                                status: TransactionStatus::Completed,
                                description: Some(format!("Earnings for trip {}", trip_id)),
                                reference_id: Some(payment.id.clone()),
                                created_at: Utc::now(),
                            },
                        )
                        .await?;
                    }
                }
            }
        }

        tx.commit().await?;

        info!(
            "Trip {} settled: {} via {} (platform fee {}, driver {})",
            trip_id, amount, method, platform_fee, driver_amount
        );

        Ok(payment)
    }

    pub async fn wallet(&self, user_id: &UserId) -> Result<Wallet, AppError> {
        let mut conn = self.repo.acquire().await?;
        repo::wallets::get_by_user(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("wallet not found".to_string()))
    }

    pub async fn transactions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, AppError> {
        let mut conn = self.repo.acquire().await?;
        let wallet = repo::wallets::get_by_user(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("wallet not found".to_string()))?;
        Ok(repo::wallets::transactions_for(&mut conn, &wallet.id, limit).await?)
    }

    /// Credit funds into a wallet.
    pub async fn deposit(
        &self,
        user_id: &UserId,
        amount: Money,
        description: Option<String>,
    ) -> Result<(Wallet, WalletTransaction), AppError> {
        if !amount.is_positive() {
            return Err(AppError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        let amount = amount.round2();

        let mut tx = self.repo.begin().await?;

        let wallet = repo::wallets::get_by_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("wallet not found".to_string()))?;

        repo::wallets::credit(&mut tx, &wallet.id, amount.to_cents()).await?;
        let balance_after =
            Money::from_cents(repo::wallets::balance_cents(&mut tx, &wallet.id).await?);

        let transaction = WalletTransaction {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet.id.clone(),
            amount,
            balance_after,
            tx_type: TransactionType::Deposit,
            status: TransactionStatus::Completed,
            description: description.or_else(|| Some("Wallet deposit".to_string())),
            reference_id: None,
            created_at: Utc::now(),
        };
        repo::wallets::insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        Ok((
            Wallet {
                balance: balance_after,
                ..wallet
            },
            transaction,
        ))
    }

    /// Withdraw funds, rejecting overdrafts.
    pub async fn withdraw(
        &self,
        user_id: &UserId,
        amount: Money,
        description: Option<String>,
    ) -> Result<(Wallet, WalletTransaction), AppError> {
        if !amount.is_positive() {
            return Err(AppError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        let amount = amount.round2();

        let mut tx = self.repo.begin().await?;

        let wallet = repo::wallets::get_by_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("wallet not found".to_string()))?;

        let debited =
            repo::wallets::debit_if_sufficient(&mut tx, &wallet.id, amount.to_cents()).await?;
        if !debited {
            return Err(AppError::InsufficientFunds {
                balance: wallet.balance,
                required: amount,
            });
        }

        let balance_after =
            Money::from_cents(repo::wallets::balance_cents(&mut tx, &wallet.id).await?);

        let transaction = WalletTransaction {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet.id.clone(),
            amount: -amount,
            balance_after,
            tx_type: TransactionType::Withdrawal,
            status: TransactionStatus::Completed,
            description: description.or_else(|| Some("Wallet withdrawal".to_string())),
            reference_id: None,
            created_at: Utc::now(),
        };
        repo::wallets::insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        Ok((
            Wallet {
                balance: balance_after,
                ..wallet
            },
            transaction,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_split_adds_up() {
        let amount = Money::from_str_canonical("5.30").unwrap();
        let fee = (amount * platform_fee_rate()).round2();
        let driver = amount - fee;
        assert_eq!(fee, Money::from_str_canonical("1.06").unwrap());
        assert_eq!(fee + driver, amount);
    }

    #[test]
    fn test_tax_is_informational_percentage() {
        let amount = Money::from_str_canonical("10").unwrap();
        assert_eq!(
            (amount * tax_rate()).round2(),
            Money::from_str_canonical("1.2").unwrap()
        );
    }
}
