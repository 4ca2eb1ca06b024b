//! Trip ratings: one per direction per completed trip.

use crate::db::{is_unique_violation, repo, Repository};
use crate::domain::{Rating, TripId, TripStatus, UserId};
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct TripRatings {
    repo: Arc<Repository>,
}

impl TripRatings {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub async fn rate(
        &self,
        trip_id: &TripId,
        from_user_id: &UserId,
        to_user_id: &UserId,
        score: i64,
        comment: Option<String>,
    ) -> Result<Rating, AppError> {
        if !(1..=5).contains(&score) {
            return Err(AppError::Validation(
                "score must be between 1 and 5".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        let trip = repo::trips::get(&mut tx, trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("trip not found".to_string()))?;

        if trip.status != TripStatus::Completed {
            return Err(AppError::Validation(format!(
                "only completed trips can be rated, trip is {}",
                trip.status
            )));
        }

        if !repo::trips::is_party(&mut tx, trip_id, from_user_id).await? {
            return Err(AppError::Forbidden(
                "user is not a party to this trip".to_string(),
            ));
        }

        if !repo::trips::is_party(&mut tx, trip_id, to_user_id).await? {
            return Err(AppError::Validation(
                "rated user did not take part in this trip".to_string(),
            ));
        }

        let rating = Rating {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.clone(),
            from_user_id: from_user_id.clone(),
            to_user_id: to_user_id.clone(),
            score,
            comment,
            created_at: Utc::now(),
        };

        match repo::ratings::insert(&mut tx, &rating).await {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(
                    "this user has already been rated for this trip".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(rating)
    }
}
