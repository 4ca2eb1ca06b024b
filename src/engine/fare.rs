//! Fare pricing: pure functions from route metrics and tariff to money.

use crate::domain::{Money, Tariff};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal as RustDecimal;

/// Price an on-demand trip.
///
/// `base + distance * per_km + duration * per_minute`, floored at the
/// tariff minimum, multiplied by the surge factor when one is set, and
/// rounded half-up to 2 decimal places.
pub fn price(distance_km: f64, duration_min: i64, tariff: &Tariff) -> Money {
    let distance = Money::new(RustDecimal::from_f64(distance_km).unwrap_or_default());
    let duration = Money::new(RustDecimal::from(duration_min));

    let mut fare =
        tariff.base_price + distance * tariff.price_per_km + duration * tariff.price_per_minute;

    if fare < tariff.minimum_price {
        fare = tariff.minimum_price;
    }

    if let Some(surge) = tariff.surge_multiplier {
        fare = fare * surge;
    }

    fare.round2()
}

/// Price an intercity trip: the driver-supplied per-seat price times the
/// seats on offer. Never derived from distance.
pub fn intercity_price(price_per_seat: Money, available_seats: i64) -> Money {
    (price_per_seat * Money::new(RustDecimal::from(available_seats))).round2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripType;

    fn tariff(base: &str, per_km: &str, per_min: &str, min: &str, surge: Option<&str>) -> Tariff {
        Tariff {
            id: "t1".to_string(),
            trip_type: TripType::OnDemand,
            vehicle_category: "STANDARD".to_string(),
            base_price: Money::from_str_canonical(base).unwrap(),
            price_per_km: Money::from_str_canonical(per_km).unwrap(),
            price_per_minute: Money::from_str_canonical(per_min).unwrap(),
            minimum_price: Money::from_str_canonical(min).unwrap(),
            surge_multiplier: surge.map(|s| Money::from_str_canonical(s).unwrap()),
            is_active: true,
        }
    }

    #[test]
    fn test_worked_example() {
        // 1.5 + 5*0.4 + 12*0.15 = 5.3
        let t = tariff("1.5", "0.4", "0.15", "2.5", None);
        assert_eq!(price(5.0, 12, &t), Money::from_str_canonical("5.3").unwrap());
    }

    #[test]
    fn test_minimum_floor() {
        let t = tariff("1.0", "0.1", "0.05", "4.0", None);
        assert_eq!(price(0.5, 2, &t), Money::from_str_canonical("4").unwrap());
    }

    #[test]
    fn test_price_never_below_minimum() {
        let t = tariff("0.5", "0.2", "0.1", "3.25", None);
        for (d, m) in [(0.0, 0), (1.0, 5), (10.0, 20), (100.0, 90)] {
            assert!(price(d, m, &t) >= t.minimum_price, "d={} m={}", d, m);
        }
    }

    #[test]
    fn test_surge_applies_after_floor() {
        let t = tariff("1.0", "0.1", "0.05", "4.0", Some("1.5"));
        // floored to 4.0, then surged
        assert_eq!(price(0.5, 2, &t), Money::from_str_canonical("6").unwrap());
    }

    #[test]
    fn test_rounds_half_up() {
        // 1 + 3*0.333 + 0 = 1.999 -> 2.00
        let t = tariff("1", "0.333", "0", "0", None);
        assert_eq!(price(3.0, 0, &t), Money::from_str_canonical("2").unwrap());
    }

    #[test]
    fn test_intercity_price() {
        let pps = Money::from_str_canonical("12.5").unwrap();
        assert_eq!(
            intercity_price(pps, 3),
            Money::from_str_canonical("37.5").unwrap()
        );
    }
}
