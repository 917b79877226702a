//! Currency rounding helpers.
//!
//! Base prices and tax amounts keep 2 decimal places; final chargeable
//! prices are whole currency units. Midpoints round away from zero to match
//! the published fare table.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places.
pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a chargeable price to whole currency units.
pub(crate) fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
