//! Domain types for the ride coordination core.
//!
//! This module provides:
//! - Lossless money handling via the Money wrapper (cents in storage)
//! - Id newtypes: UserId, TripId, DriverId, WalletId
//! - Trip/TripPassenger with the lifecycle status enum
//! - Wallet, Payment, PromoCode, Tariff and Rating records

pub mod driver;
pub mod ids;
pub mod money;
pub mod payment;
pub mod promo;
pub mod rating;
pub mod tariff;
pub mod trip;
pub mod user;
pub mod wallet;

pub use driver::{Driver, Vehicle, VerificationStatus};
pub use ids::{DriverId, TripId, UserId, WalletId};
pub use money::Money;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use promo::{PromoApplication, PromoCode, PromoSummary};
pub use rating::Rating;
pub use tariff::Tariff;
pub use trip::{Location, Trip, TripPassenger, TripStatus, TripType};
pub use user::{User, UserRole};
pub use wallet::{TransactionStatus, TransactionType, Wallet, WalletTransaction};
