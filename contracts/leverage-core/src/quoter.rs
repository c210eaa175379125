use crate::constants::BPS;
use crate::errors::LeverageError;
use crate::model::{self, is_within_bounds, validate_bounds};
use crate::types::{Direction, LeverageBounds, MarketState, Position, RebalanceQuote};

/// Quote the debt-token movement that brings the position back to target.
///
/// Collateral and debt are assumed to move in lockstep at the prices in
/// `state`, so equity is unchanged by the rebalance itself and the target
/// can be solved for in closed form.
pub fn quote(state: &MarketState, bounds: &LeverageBounds) -> Result<RebalanceQuote, LeverageError> {
    let position = state.position()?;
    quote_position(&position, state.debt_price, state.max_leverage_bps, bounds)
}

pub fn quote_position(
    position: &Position,
    debt_price: u128,
    max_leverage_bps: u128,
    bounds: &LeverageBounds,
) -> Result<RebalanceQuote, LeverageError> {
    validate_bounds(bounds)?;
    let leverage = position.leverage_bps()?;
    if is_within_bounds(leverage, bounds) {
        return Ok(RebalanceQuote::none(leverage));
    }

    let collateral_scaled = position
        .collateral_value_base
        .checked_mul(BPS)
        .ok_or(LeverageError::MathOverflow)?;
    let target_scaled = bounds
        .target_bps
        .checked_mul(position.equity_base())
        .ok_or(LeverageError::MathOverflow)?;

    let (direction, delta_scaled, subsidy_bps) = if leverage > bounds.upper_bound_bps {
        (
            Direction::Decrease,
            collateral_scaled.checked_sub(target_scaled),
            decrease_subsidy_bps(leverage, max_leverage_bps, bounds),
        )
    } else {
        (
            Direction::Increase,
            target_scaled.checked_sub(collateral_scaled),
            increase_subsidy_bps(leverage, bounds),
        )
    };
    let delta_value = delta_scaled.ok_or(LeverageError::MathOverflow)? / BPS;
    let required = model::token_amount(delta_value, debt_price)?;
    if required == 0 {
        return Ok(RebalanceQuote::none(leverage));
    }

    Ok(RebalanceQuote {
        required_debt_token_amount: required,
        direction,
        estimated_subsidy_bps: subsidy_bps,
        current_leverage_bps: leverage,
    })
}

/// Zero at the upper bound, `max_subsidy_bps` once leverage reaches the
/// configured ceiling or the pool's hard limit, whichever is lower.
pub fn decrease_subsidy_bps(leverage_bps: u128, max_leverage_bps: u128, bounds: &LeverageBounds) -> u128 {
    let end = if max_leverage_bps > 0 {
        bounds.subsidy_ceiling_bps.min(max_leverage_bps)
    } else {
        bounds.subsidy_ceiling_bps
    };
    let distance = leverage_bps.saturating_sub(bounds.upper_bound_bps);
    scale_subsidy(distance, end.saturating_sub(bounds.upper_bound_bps), bounds.max_subsidy_bps)
}

/// Zero at the lower bound, `max_subsidy_bps` at 1x (no debt at all).
pub fn increase_subsidy_bps(leverage_bps: u128, bounds: &LeverageBounds) -> u128 {
    let distance = bounds.lower_bound_bps.saturating_sub(leverage_bps);
    scale_subsidy(distance, bounds.lower_bound_bps.saturating_sub(BPS), bounds.max_subsidy_bps)
}

fn scale_subsidy(distance: u128, span: u128, max_subsidy_bps: u128) -> u128 {
    if span == 0 || distance >= span {
        return max_subsidy_bps;
    }
    max_subsidy_bps.saturating_mul(distance) / span
}
