use leverage_core::constants::BPS;
use leverage_core::events::{LeftoverCollateralTransferred, RebalanceExecuted};
use leverage_core::interfaces::{expect_leg, PoolAdapterClient};
use leverage_core::market::read_market_state;
use leverage_core::model::{convert_with_premium, is_within_bounds};
use leverage_core::{quoter, Direction, LeverageError, RebalanceOutcome, SettlementStep, SwapInstruction};
use soroban_sdk::{Address, Env};

use crate::flash;
use crate::helpers::{authorize_transfer_from_self, self_balance, transfer_out};
use crate::settlement::{ensure_settled, pay_caller, pull_caller_funds, SettlementLedger};
use crate::storage::get_vault_config;
use crate::swap;

/// Repay the quoted debt (flash-funding whatever the caller did not bring),
/// withdraw the matching collateral plus subsidy, sell just enough of it to
/// close the flash loan, pay the caller, then return any leftover to the vault.
pub fn decrease_leverage(
    env: &Env,
    caller: &Address,
    vault: &Address,
    flash_provider: &Address,
    caller_debt_contribution: u128,
    min_output_collateral: u128,
    swap_instruction: &SwapInstruction,
) -> Result<RebalanceOutcome, LeverageError> {
    caller.require_auth();
    let config = get_vault_config(env, vault)?;
    let pool = PoolAdapterClient::new(env, vault);
    let me = env.current_contract_address();

    let collateral_token = pool.collateral_token();
    let debt_token = pool.debt_token();
    let state = read_market_state(env, vault, &config.oracle)?;
    let quote = quoter::quote(&state, &config.bounds)?;
    match quote.direction {
        Direction::None => return Err(LeverageError::NoRebalanceNeeded),
        Direction::Increase => return Err(LeverageError::WrongDirection),
        Direction::Decrease => {}
    }
    let required = quote.required_debt_token_amount;

    let mut ledger = SettlementLedger::new(env);
    let available = pull_caller_funds(env, &mut ledger, &debt_token, caller, caller_debt_contribution)?;
    let funded_by_caller = available.min(required);
    let request = flash::request(
        env,
        flash_provider,
        &debt_token,
        flash::shortfall(required, available),
    )?;
    if request.amount > 0 {
        swap::validate(
            swap_instruction,
            &collateral_token,
            &debt_token,
            request.amount.saturating_add(request.fee),
        )?;
    }
    let ticket = flash::begin(env, flash_provider, &request, &mut ledger)?;

    authorize_transfer_from_self(env, &debt_token, vault, required)?;
    expect_leg(pool.try_repay(&me, &required), LeverageError::PoolLegFailed)?;
    ledger.record(SettlementStep::PoolRepaid);

    let subsidy_bps = quote.estimated_subsidy_bps;
    let withdraw_amount = entitlement(required, state.debt_price, state.collateral_price, subsidy_bps)?
        .min(state.collateral_amount);
    let collateral_before = self_balance(env, &collateral_token);
    expect_leg(pool.try_withdraw(&me, &withdraw_amount), LeverageError::PoolLegFailed)?;
    let withdrawn = self_balance(env, &collateral_token).saturating_sub(collateral_before);
    ledger.pool_received = withdrawn;
    ledger.record(SettlementStep::PoolWithdrawn);

    let entitled = entitlement(funded_by_caller, state.debt_price, state.collateral_price, subsidy_bps)?
        .min(withdrawn);

    if let Some(open) = ticket.as_ref() {
        let owed = open.owed();
        let on_hand = self_balance(env, &debt_token);
        let needed = owed.saturating_sub(on_hand);
        if needed > 0 {
            // Never sell into the caller's entitlement.
            let max_in = swap_instruction.limit.min(withdrawn - entitled);
            swap::exact_output(env, swap_instruction, max_in, needed, &mut ledger)?;
        }
    }
    flash::complete(env, flash_provider, ticket, &mut ledger)?;

    // Caller first. Only once the entitled payout has gone out may anything
    // be swept, otherwise a sweep can starve the payout.
    let collateral_left = self_balance(env, &collateral_token);
    let mut payout = entitled.min(collateral_left);
    let mut leftover = collateral_left - payout;
    let dust = expect_leg(pool.try_exchange_threshold(), LeverageError::PoolLegFailed)?;
    if leftover <= dust {
        payout += leftover;
        leftover = 0;
    }
    if payout < min_output_collateral {
        return Err(LeverageError::InsufficientOutput);
    }
    pay_caller(env, &mut ledger, &collateral_token, caller, payout, true)?;
    let debt_residual = self_balance(env, &debt_token);
    pay_caller(env, &mut ledger, &debt_token, caller, debt_residual, false)?;

    if leftover > 0 {
        let deposit_cap = expect_leg(pool.try_max_deposit(&me), LeverageError::PoolLegFailed)?;
        if leftover <= deposit_cap {
            authorize_transfer_from_self(env, &collateral_token, vault, leftover)?;
            expect_leg(pool.try_deposit(&me, &leftover), LeverageError::PoolLegFailed)?;
        } else {
            // The pool cannot book it as collateral, but it still belongs to the vault.
            transfer_out(env, &collateral_token, vault, leftover)?;
        }
        ledger.swept_to_vault = leftover;
        ledger.record(SettlementStep::LeftoverSwept);
        LeftoverCollateralTransferred {
            token: collateral_token.clone(),
            amount: leftover,
            recipient: vault.clone(),
        }
        .publish(env);
    }
    ensure_settled(env, &collateral_token, &debt_token)?;

    let resulting = read_market_state(env, vault, &config.oracle)?
        .position()?
        .leverage_bps()?;
    // A full-quote decrease lands between target and the upper bound.
    if resulting >= quote.current_leverage_bps
        || resulting < config.bounds.target_bps
        || !is_within_bounds(resulting, &config.bounds)
    {
        return Err(LeverageError::RebalanceOutOfBounds);
    }

    RebalanceExecuted {
        vault: vault.clone(),
        direction: Direction::Decrease,
        amount: required,
        resulting_leverage_bps: resulting,
    }
    .publish(env);

    Ok(ledger.into_outcome(Direction::Decrease, required, quote.current_leverage_bps, resulting))
}

/// Collateral released for `debt_amount` of repaid debt, subsidy included.
pub fn entitlement(
    debt_amount: u128,
    debt_price: u128,
    collateral_price: u128,
    subsidy_bps: u128,
) -> Result<u128, LeverageError> {
    if subsidy_bps > BPS {
        return Err(LeverageError::InvalidAmount);
    }
    convert_with_premium(debt_amount, debt_price, collateral_price, subsidy_bps)
}
