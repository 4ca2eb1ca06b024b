//! Pure pricing and geometry logic: no I/O, no clock, no persistence.

pub mod fare;
pub mod geo;
pub mod promo;

pub use fare::{intercity_price, price};
pub use geo::haversine_km;
pub use promo::compute_discount;
