use crate::constants::{BPS, MAX_SUBSIDY_BPS, SCALE_1E6};
use crate::errors::LeverageError;
use crate::types::LeverageBounds;

/// `collateral * 10_000 / (collateral - debt)`.
pub fn current_leverage_bps(
    collateral_value_base: u128,
    debt_value_base: u128,
) -> Result<u128, LeverageError> {
    if debt_value_base > collateral_value_base {
        return Err(LeverageError::PositionInsolvent);
    }
    let equity = collateral_value_base - debt_value_base;
    if equity == 0 {
        return Err(LeverageError::DivisionByZero);
    }
    let scaled = collateral_value_base
        .checked_mul(BPS)
        .ok_or(LeverageError::MathOverflow)?;
    Ok(scaled / equity)
}

pub fn is_within_bounds(leverage_bps: u128, bounds: &LeverageBounds) -> bool {
    bounds.lower_bound_bps <= leverage_bps && leverage_bps <= bounds.upper_bound_bps
}

pub fn validate_bounds(bounds: &LeverageBounds) -> Result<(), LeverageError> {
    if bounds.lower_bound_bps < BPS
        || bounds.lower_bound_bps >= bounds.target_bps
        || bounds.target_bps >= bounds.upper_bound_bps
        || bounds.upper_bound_bps >= bounds.subsidy_ceiling_bps
        || bounds.max_subsidy_bps > MAX_SUBSIDY_BPS
    {
        return Err(LeverageError::InvalidBoundsConfiguration);
    }
    Ok(())
}

/// Token amount -> base units at a 1e6-scaled price. Rounds down.
pub fn value_base(amount: u128, price: u128) -> Result<u128, LeverageError> {
    amount
        .checked_mul(price)
        .map(|v| v / SCALE_1E6)
        .ok_or(LeverageError::MathOverflow)
}

/// Base units -> token amount at a 1e6-scaled price. Rounds down.
pub fn token_amount(value_base: u128, price: u128) -> Result<u128, LeverageError> {
    if price == 0 {
        return Err(LeverageError::DivisionByZero);
    }
    value_base
        .checked_mul(SCALE_1E6)
        .map(|v| v / price)
        .ok_or(LeverageError::MathOverflow)
}

/// `amount * bps / 10_000`, rounded down.
pub fn apply_bps(amount: u128, bps: u128) -> Result<u128, LeverageError> {
    amount
        .checked_mul(bps)
        .map(|v| v / BPS)
        .ok_or(LeverageError::MathOverflow)
}

/// Convert an amount of one token into the other at oracle prices, with an
/// optional premium in basis points on top.
pub fn convert_with_premium(
    amount: u128,
    price_from: u128,
    price_to: u128,
    premium_bps: u128,
) -> Result<u128, LeverageError> {
    let value = value_base(amount, price_from)?;
    let with_premium = apply_bps(
        value,
        BPS.checked_add(premium_bps)
            .ok_or(LeverageError::MathOverflow)?,
    )?;
    token_amount(with_premium, price_to)
}
