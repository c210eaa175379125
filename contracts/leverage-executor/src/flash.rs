use leverage_core::interfaces::{expect_leg, FlashLiquidityProviderClient};
use leverage_core::{FlashLoanRequest, FlashTicket, LeverageError, SettlementStep};
use soroban_sdk::{Address, Env};

use crate::helpers::{self_balance, transfer_out};
use crate::settlement::SettlementLedger;

/// Flash amount needed on top of what the executor already holds.
pub fn shortfall(required: u128, balance: u128) -> u128 {
    required.saturating_sub(balance)
}

pub fn request(
    env: &Env,
    provider: &Address,
    token: &Address,
    amount: u128,
) -> Result<FlashLoanRequest, LeverageError> {
    let client = FlashLiquidityProviderClient::new(env, provider);
    let available = expect_leg(client.try_max_flash_loan(token), LeverageError::FlashLegFailed)?;
    if available < amount {
        return Err(LeverageError::FlashLiquidityUnavailable);
    }
    let fee = expect_leg(client.try_flash_fee(token, &amount), LeverageError::FlashLegFailed)?;
    Ok(FlashLoanRequest {
        token: token.clone(),
        amount,
        fee,
    })
}

/// First phase: take the funds and keep the ticket. Nothing is borrowed when
/// the request amount is zero.
pub fn begin(
    env: &Env,
    provider: &Address,
    request: &FlashLoanRequest,
    ledger: &mut SettlementLedger,
) -> Result<Option<FlashTicket>, LeverageError> {
    if request.amount == 0 {
        return Ok(None);
    }
    let client = FlashLiquidityProviderClient::new(env, provider);
    let before = self_balance(env, &request.token);
    let ticket = expect_leg(
        client.try_begin_flash_loan(&env.current_contract_address(), &request.token, &request.amount),
        LeverageError::FlashLegFailed,
    )?;
    let received = self_balance(env, &request.token).saturating_sub(before);
    if received < request.amount || ticket.amount != request.amount || ticket.fee > request.fee {
        return Err(LeverageError::FlashLegFailed);
    }
    ledger.flash_borrowed = ticket.amount;
    ledger.flash_fee = ticket.fee;
    ledger.record(SettlementStep::FlashBorrowed);
    Ok(Some(ticket))
}

/// Second phase: send back principal + fee and surrender the ticket.
pub fn complete(
    env: &Env,
    provider: &Address,
    ticket: Option<FlashTicket>,
    ledger: &mut SettlementLedger,
) -> Result<(), LeverageError> {
    let Some(ticket) = ticket else {
        return Ok(());
    };
    let owed = ticket.owed();
    if self_balance(env, &ticket.token) < owed {
        return Err(LeverageError::InsufficientRepayment);
    }
    transfer_out(env, &ticket.token, provider, owed)?;
    let client = FlashLiquidityProviderClient::new(env, provider);
    let settled = expect_leg(client.try_complete_flash_loan(&ticket), LeverageError::FlashLegFailed)?;
    if !settled {
        return Err(LeverageError::InsufficientRepayment);
    }
    ledger.record(SettlementStep::FlashRepaid);
    Ok(())
}
