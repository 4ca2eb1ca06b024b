//! The trip status transition table, scoped by actor role.

use crate::domain::TripStatus;
use crate::error::AppError;

/// Who is asking for the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Driver,
    Passenger,
}

/// Whether the transition table allows `from -> to` for this actor.
///
/// Acceptance of a SEARCHING trip is not listed here; it goes through
/// the dispatch coordinator's claim, not a plain status update.
pub fn allowed(from: TripStatus, to: TripStatus, actor: Actor) -> bool {
    use TripStatus::*;

    match actor {
        Actor::Driver => matches!(
            (from, to),
            (Scheduled, Confirmed)
                | (Scheduled, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        ),
        Actor::Passenger => matches!(
            (from, to),
            (Searching, Cancelled) | (Scheduled, Cancelled) | (Confirmed, Cancelled)
        ),
    }
}

/// Reject anything outside the table as an invalid transition.
pub fn validate(from: TripStatus, to: TripStatus, actor: Actor) -> Result<(), AppError> {
    if allowed(from, to, actor) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}
