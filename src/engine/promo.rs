//! Discount computation for promo codes. Eligibility and usage counting
//! live in the promotions service; this is just the arithmetic.

use crate::domain::{Money, PromoCode};
use rust_decimal::Decimal as RustDecimal;

/// Compute the discount a code grants on an amount.
///
/// When both a fixed amount and a percentage are configured the larger
/// wins; the result is capped at `max_discount` and never exceeds the
/// amount itself.
pub fn compute_discount(promo: &PromoCode, amount: Money) -> Money {
    let mut discount = promo.discount_amount.unwrap_or_else(Money::zero);

    if let Some(percent) = promo.discount_percent {
        let percent_discount = amount * percent / Money::new(RustDecimal::ONE_HUNDRED);
        if percent_discount > discount {
            discount = percent_discount;
        }
    }

    if let Some(max) = promo.max_discount {
        if discount > max {
            discount = max;
        }
    }

    if discount > amount {
        discount = amount;
    }

    discount.round2()
}
