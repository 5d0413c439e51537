//! Futures / basis / cash price conversions.
//!
//! Futures and cash prices are dollars per bushel. Basis is cents per
//! bushel. The `/ 100` in [`cash_price`] is the only unit conversion in the
//! system.

/// Cents per dollar.
pub const CENTS_PER_DOLLAR: f64 = 100.0;

/// Cash price in $/bu from a futures price and a basis in cents.
///
/// A missing basis counts as zero. A missing futures leg makes the price
/// unknown.
pub fn cash_price(futures: Option<f64>, basis_cents: Option<f64>) -> Option<f64> {
    futures.map(|f| f + basis_cents.unwrap_or(0.0) / CENTS_PER_DOLLAR)
}

/// Basis in cents between a cash and a futures price, rounded to 0.1 cent.
pub fn basis_cents(cash: f64, futures: f64) -> f64 {
    round_basis((cash - futures) * CENTS_PER_DOLLAR)
}

/// Round a basis value to one decimal of a cent.
pub fn round_basis(cents: f64) -> f64 {
    (cents * 10.0).round() / 10.0
}

/// Bushel-weighted average of `(price, bushels)` pairs.
///
/// `None` when the total weight is not positive.
pub fn weighted_average<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (value, weight) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(v, w), (price, bushels)| {
            (v + price * bushels, w + bushels)
        });
    if weight > 0.0 {
        Some(value / weight)
    } else {
        None
    }
}
