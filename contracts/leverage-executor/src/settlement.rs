use leverage_core::events::CallerSettled;
use leverage_core::{Direction, LeverageError, RebalanceOutcome, SettlementStep};
use soroban_sdk::{Address, Env, Vec};

use crate::helpers::{pull_from, self_balance, transfer_out};

/// Per-invocation accounting of every token movement through the executor.
/// Lives only for the duration of one call.
pub struct SettlementLedger {
    pub prefunded: u128,
    pub pulled_from_caller: u128,
    pub flash_borrowed: u128,
    pub flash_fee: u128,
    pub swap_spent: u128,
    pub swap_received: u128,
    pub pool_received: u128,
    pub caller_collateral_payout: u128,
    pub caller_debt_payout: u128,
    pub swept_to_vault: u128,
    pub trail: Vec<SettlementStep>,
}

impl SettlementLedger {
    pub fn new(env: &Env) -> Self {
        SettlementLedger {
            prefunded: 0,
            pulled_from_caller: 0,
            flash_borrowed: 0,
            flash_fee: 0,
            swap_spent: 0,
            swap_received: 0,
            pool_received: 0,
            caller_collateral_payout: 0,
            caller_debt_payout: 0,
            swept_to_vault: 0,
            trail: Vec::new(env),
        }
    }

    pub fn record(&mut self, step: SettlementStep) {
        self.trail.push_back(step);
    }

    pub fn into_outcome(
        self,
        direction: Direction,
        amount: u128,
        starting_leverage_bps: u128,
        resulting_leverage_bps: u128,
    ) -> RebalanceOutcome {
        RebalanceOutcome {
            direction,
            amount,
            caller_funded: self.prefunded.saturating_add(self.pulled_from_caller),
            flash_borrowed: self.flash_borrowed,
            flash_fee: self.flash_fee,
            swap_spent: self.swap_spent,
            swap_received: self.swap_received,
            pool_received: self.pool_received,
            caller_collateral_payout: self.caller_collateral_payout,
            caller_debt_payout: self.caller_debt_payout,
            swept_to_vault: self.swept_to_vault,
            starting_leverage_bps,
            resulting_leverage_bps,
            trail: self.trail,
        }
    }
}

/// Pull the caller's contribution and return the executor's true balance
/// afterwards. The shortfall is computed from that balance, never from the
/// claimed contribution.
pub fn pull_caller_funds(
    env: &Env,
    ledger: &mut SettlementLedger,
    token: &Address,
    caller: &Address,
    amount: u128,
) -> Result<u128, LeverageError> {
    let before = self_balance(env, token);
    ledger.prefunded = before;
    pull_from(env, token, caller, amount)?;
    let after = self_balance(env, token);
    ledger.pulled_from_caller = after.saturating_sub(before);
    if ledger.pulled_from_caller > 0 {
        ledger.record(SettlementStep::PulledFromCaller);
    }
    Ok(after)
}

pub fn pay_caller(
    env: &Env,
    ledger: &mut SettlementLedger,
    token: &Address,
    caller: &Address,
    amount: u128,
    collateral: bool,
) -> Result<(), LeverageError> {
    if amount == 0 {
        return Ok(());
    }
    transfer_out(env, token, caller, amount)?;
    if collateral {
        ledger.caller_collateral_payout = ledger.caller_collateral_payout.saturating_add(amount);
    } else {
        ledger.caller_debt_payout = ledger.caller_debt_payout.saturating_add(amount);
    }
    ledger.record(SettlementStep::CallerPaid);
    CallerSettled {
        caller: caller.clone(),
        token: token.clone(),
        amount,
    }
    .publish(env);
    Ok(())
}

/// The executor never carries a balance past the end of an invocation.
pub fn ensure_settled(env: &Env, collateral_token: &Address, debt_token: &Address) -> Result<(), LeverageError> {
    if self_balance(env, collateral_token) != 0 || self_balance(env, debt_token) != 0 {
        return Err(LeverageError::ResidualBalance);
    }
    Ok(())
}
