//! Promo code application.
//!
//! The eligibility checks and the usage-count increment share one
//! atomic unit, with the limit re-checked inside the guarded UPDATE,
//! so concurrent applications cannot push `current_uses` past the limit.

use crate::db::{repo, Repository};
use crate::domain::{Money, PromoApplication, PromoSummary, TripType};
use crate::engine;
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct Promotions {
    repo: Arc<Repository>,
}

impl Promotions {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub async fn apply(
        &self,
        code: &str,
        amount: Money,
        trip_type: TripType,
    ) -> Result<PromoApplication, AppError> {
        let mut tx = self.repo.begin().await?;

        let promo = repo::promos::get_by_code(&mut tx, code)
            .await?
            .ok_or_else(|| AppError::NotFound("promo code not found".to_string()))?;

        if !promo.is_active {
            return Err(AppError::Validation(
                "promo code is not active".to_string(),
            ));
        }

        let now = Utc::now();
        if promo.start_date > now || promo.end_date < now {
            return Err(AppError::Validation(
                "promo code is not currently valid".to_string(),
            ));
        }

        if let Some(limit) = promo.usage_limit {
            if promo.current_uses >= limit {
                return Err(AppError::Conflict(
                    "promo code has reached its usage limit".to_string(),
                ));
            }
        }

        if !promo.applicable_trip_types.contains(&trip_type) {
            return Err(AppError::Validation(
                "promo code does not apply to this trip type".to_string(),
            ));
        }

        if let Some(min) = promo.min_trip_amount {
            if amount < min {
                return Err(AppError::Validation(format!(
                    "minimum amount to use this code is {}",
                    min
                )));
            }
        }

        let discount = engine::compute_discount(&promo, amount);

        // Guarded increment: loses the race cleanly if a concurrent
        // application just consumed the last use.
        if !repo::promos::increment_usage_guarded(&mut tx, &promo.id).await? {
            return Err(AppError::Conflict(
                "promo code has reached its usage limit".to_string(),
            ));
        }

        tx.commit().await?;

        info!("Promo {} applied: {} off {}", promo.code, discount, amount);

        Ok(PromoApplication {
            original_amount: amount,
            discount,
            final_amount: amount - discount,
            promo_code: PromoSummary {
                id: promo.id,
                code: promo.code,
                description: promo.description,
            },
        })
    }
}
