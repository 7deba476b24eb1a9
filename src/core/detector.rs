//! Percentage change between consecutive observations

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Percentage change from `previous` to `current`:
/// `(current - previous) / previous * 100`.
///
/// A zero baseline yields `0.0` rather than a division error; callers
/// with no baseline at all must not invoke the detector in the first
/// place.
pub fn percent_change(current: Decimal, previous: Decimal) -> f64 {
    if previous.is_zero() {
        return 0.0;
    }

    let current = current.to_f64().unwrap_or(0.0);
    let previous = previous.to_f64().unwrap_or(0.0);
    if previous == 0.0 {
        return 0.0;
    }

    (current - previous) / previous * 100.0
}
