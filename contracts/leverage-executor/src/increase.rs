use leverage_core::events::RebalanceExecuted;
use leverage_core::interfaces::{expect_leg, PoolAdapterClient};
use leverage_core::market::read_market_state;
use leverage_core::model::{apply_bps, is_within_bounds};
use leverage_core::{quoter, Direction, LeverageError, RebalanceOutcome, SettlementStep, SwapInstruction};
use soroban_sdk::{Address, Env};

use crate::flash;
use crate::helpers::{authorize_transfer_from_self, self_balance};
use crate::settlement::{ensure_settled, pay_caller, pull_caller_funds, SettlementLedger};
use crate::storage::get_vault_config;
use crate::swap;
use crate::token_kind::{self, SwapRoute};

/// Flash-borrow the shortfall, buy collateral, supply it, borrow the quoted
/// debt from the pool, repay the flash loan and return the rest to the caller.
pub fn increase_leverage(
    env: &Env,
    caller: &Address,
    vault: &Address,
    flash_provider: &Address,
    caller_contribution: u128,
    swap_instruction: &SwapInstruction,
) -> Result<RebalanceOutcome, LeverageError> {
    caller.require_auth();
    let config = get_vault_config(env, vault)?;
    let pool = PoolAdapterClient::new(env, vault);
    let me = env.current_contract_address();

    let deposit_cap = expect_leg(pool.try_max_deposit(&me), LeverageError::PoolLegFailed)?;
    if deposit_cap == 0 {
        return Err(LeverageError::DepositsDisabled);
    }

    let collateral_token = pool.collateral_token();
    let debt_token = pool.debt_token();
    let state = read_market_state(env, vault, &config.oracle)?;
    let quote = quoter::quote(&state, &config.bounds)?;
    match quote.direction {
        Direction::None => return Err(LeverageError::NoRebalanceNeeded),
        Direction::Decrease => return Err(LeverageError::WrongDirection),
        Direction::Increase => {}
    }
    let required = quote.required_debt_token_amount;
    swap::validate(swap_instruction, &debt_token, &collateral_token, required)?;
    let kind = token_kind::probe(env, &collateral_token);
    if token_kind::buy_route(env, &kind) == SwapRoute::Closed {
        return Err(LeverageError::PrincipalTokenMatured);
    }

    let mut ledger = SettlementLedger::new(env);
    let available = pull_caller_funds(env, &mut ledger, &debt_token, caller, caller_contribution)?;
    let request = flash::request(
        env,
        flash_provider,
        &debt_token,
        flash::shortfall(required, available),
    )?;
    let ticket = flash::begin(env, flash_provider, &request, &mut ledger)?;

    swap::exact_input(env, swap_instruction, required, &mut ledger)?;

    // Everything the executor holds in collateral belongs to the vault.
    let to_supply = self_balance(env, &collateral_token);
    if to_supply > deposit_cap {
        return Err(LeverageError::DepositCapExceeded);
    }
    let shares = expect_leg(pool.try_preview_deposit(&to_supply), LeverageError::PoolLegFailed)?;
    if shares == 0 {
        return Err(LeverageError::InsufficientOutput);
    }
    authorize_transfer_from_self(env, &collateral_token, vault, to_supply)?;
    expect_leg(pool.try_deposit(&me, &to_supply), LeverageError::PoolLegFailed)?;
    ledger.record(SettlementStep::PoolSupplied);

    let subsidy = apply_bps(required, quote.estimated_subsidy_bps)?;
    let borrow_amount = required
        .checked_add(subsidy)
        .ok_or(LeverageError::MathOverflow)?;
    let debt_before = self_balance(env, &debt_token);
    expect_leg(pool.try_borrow(&me, &borrow_amount), LeverageError::PoolLegFailed)?;
    ledger.pool_received = self_balance(env, &debt_token).saturating_sub(debt_before);
    ledger.record(SettlementStep::PoolBorrowed);

    flash::complete(env, flash_provider, ticket, &mut ledger)?;

    let residual = self_balance(env, &debt_token);
    pay_caller(env, &mut ledger, &debt_token, caller, residual, false)?;
    ensure_settled(env, &collateral_token, &debt_token)?;

    let resulting = read_market_state(env, vault, &config.oracle)?
        .position()?
        .leverage_bps()?;
    if resulting <= quote.current_leverage_bps || !is_within_bounds(resulting, &config.bounds) {
        return Err(LeverageError::RebalanceOutOfBounds);
    }

    RebalanceExecuted {
        vault: vault.clone(),
        direction: Direction::Increase,
        amount: required,
        resulting_leverage_bps: resulting,
    }
    .publish(env);

    Ok(ledger.into_outcome(Direction::Increase, required, quote.current_leverage_bps, resulting))
}
