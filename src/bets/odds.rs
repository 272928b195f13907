use rust_decimal::{Decimal, RoundingStrategy};

/// Shown instead of a ratio when a stake is zero, or when the ratio does not
/// fit in a `Decimal`.
pub const DIVIDE_BY_ZERO: &str = "Cannot divide by 0";

/// Larger stake over smaller stake, so the result is always >= 1.
/// `None` when either stake is not positive or the quotient overflows.
pub fn odds_ratio(proposer_stake: Decimal, accepter_stake: Decimal) -> Option<Decimal> {
    if proposer_stake <= Decimal::ZERO || accepter_stake <= Decimal::ZERO {
        return None;
    }

    let ratio = proposer_stake.checked_div(accepter_stake)?;
    if ratio < Decimal::ONE {
        // divide the other way round instead of inverting, keeps 1/3 exact
        accepter_stake.checked_div(proposer_stake)
    } else {
        Some(ratio)
    }
}

/// Formats the odds as `"1 / X"`. `X` is printed as an integer when its
/// two-decimal rounding is within 0.001 of its whole rounding, otherwise
/// with exactly two decimals.
///
/// Returns [`DIVIDE_BY_ZERO`] when either stake is zero or negative, and
/// also when the quotient overflows `Decimal` (e.g. `Decimal::MAX` against
/// a stake of `1e-10`); such a ratio has no meaningful display either.
pub fn format_odds(proposer_stake: Decimal, accepter_stake: Decimal) -> String {
    let Some(ratio) = odds_ratio(proposer_stake, accepter_stake) else {
        return DIVIDE_BY_ZERO.to_string();
    };

    let two = ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let whole = ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    if (two - whole).abs() < Decimal::new(1, 3) {
        format!("1 / {:.0}", whole)
    } else {
        format!("1 / {:.2}", two)
    }
}
