use bigdecimal::{BigDecimal, RoundingMode};

/// Rounds a monetary amount half-up to two decimal places.
pub fn round_money(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Formats an amount the way it crosses the API boundary, e.g. `"597.00"`.
/// The explicit precision matters for zero, which displays as `"0"` at any
/// scale.
pub fn format_money(amount: &BigDecimal) -> String {
    format!("{:.2}", round_money(amount))
}
