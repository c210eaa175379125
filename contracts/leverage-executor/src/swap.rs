use leverage_core::interfaces::{expect_leg, SwapVenueClient};
use leverage_core::{LeverageError, SettlementStep, SwapInstruction};
use soroban_sdk::{Address, Env};

use crate::helpers::{approve_spender, revoke_spender, self_balance};
use crate::settlement::SettlementLedger;

/// Token pair must match the leg we are about to run and the executor may
/// not swap more than the caller priced the instruction for.
pub fn validate(
    swap: &SwapInstruction,
    token_in: &Address,
    token_out: &Address,
    amount: u128,
) -> Result<(), LeverageError> {
    if swap.token_in != *token_in || swap.token_out != *token_out {
        return Err(LeverageError::SwapInstructionMismatch);
    }
    if amount > swap.amount {
        return Err(LeverageError::QuoteExceedsInstruction);
    }
    Ok(())
}

/// Balance movement of one swap as seen from the executor.
pub struct SwapFill {
    pub spent: u128,
    pub received: u128,
}

fn measured<F>(env: &Env, swap: &SwapInstruction, allowance: u128, call: F) -> Result<SwapFill, LeverageError>
where
    F: FnOnce(&SwapVenueClient) -> Result<u128, LeverageError>,
{
    let in_before = self_balance(env, &swap.token_in);
    let out_before = self_balance(env, &swap.token_out);

    approve_spender(env, &swap.token_in, &swap.venue, allowance)?;
    // The venue's own figure is not trusted; only balance deltas count.
    let _reported = call(&SwapVenueClient::new(env, &swap.venue))?;
    revoke_spender(env, &swap.token_in, &swap.venue);

    let in_after = self_balance(env, &swap.token_in);
    let out_after = self_balance(env, &swap.token_out);
    Ok(SwapFill {
        spent: in_before.saturating_sub(in_after),
        received: out_after.saturating_sub(out_before),
    })
}

pub fn exact_input(
    env: &Env,
    swap: &SwapInstruction,
    amount_in: u128,
    ledger: &mut SettlementLedger,
) -> Result<SwapFill, LeverageError> {
    let me = env.current_contract_address();
    let fill = measured(env, swap, amount_in, |venue| {
        expect_leg(
            venue.try_swap_exact_input(
                &me,
                &swap.token_in,
                &swap.token_out,
                &amount_in,
                &swap.limit,
                &swap.payload,
            ),
            LeverageError::SwapLegFailed,
        )
    })?;
    if fill.spent > amount_in || fill.received < swap.limit {
        return Err(LeverageError::SlippageExceeded);
    }
    ledger.swap_spent = ledger.swap_spent.saturating_add(fill.spent);
    ledger.swap_received = ledger.swap_received.saturating_add(fill.received);
    ledger.record(SettlementStep::Swapped);
    Ok(fill)
}

pub fn exact_output(
    env: &Env,
    swap: &SwapInstruction,
    max_in: u128,
    exact_out: u128,
    ledger: &mut SettlementLedger,
) -> Result<SwapFill, LeverageError> {
    let me = env.current_contract_address();
    let fill = measured(env, swap, max_in, |venue| {
        expect_leg(
            venue.try_swap_exact_output(
                &me,
                &swap.token_in,
                &swap.token_out,
                &max_in,
                &exact_out,
                &swap.payload,
            ),
            LeverageError::SwapLegFailed,
        )
    })?;
    if fill.spent > max_in {
        return Err(LeverageError::SlippageExceeded);
    }
    ledger.swap_spent = ledger.swap_spent.saturating_add(fill.spent);
    ledger.swap_received = ledger.swap_received.saturating_add(fill.received);
    ledger.record(SettlementStep::Swapped);
    Ok(fill)
}
