use soroban_sdk::{Address, Bytes, Env};

use crate::errors::LeverageError;
use crate::types::FlashTicket;

/// Vault-side lending pool: supply/borrow/repay/withdraw for one leveraged
/// position plus the views the quoter needs.
#[soroban_sdk::contractclient(name = "PoolAdapterClient")]
pub trait PoolAdapter {
    fn collateral_token(env: Env) -> Address;
    fn debt_token(env: Env) -> Address;
    fn collateral_amount(env: Env) -> u128;
    fn debt_amount(env: Env) -> u128;
    /// Minimum amount worth moving on its own; smaller residuals are dust.
    fn exchange_threshold(env: Env) -> u128;
    /// 0 means deposits are disabled.
    fn max_deposit(env: Env, account: Address) -> u128;
    fn max_leverage_bps(env: Env) -> u128;
    fn preview_deposit(env: Env, assets: u128) -> u128;
    fn preview_mint(env: Env, shares: u128) -> u128;
    fn deposit(env: Env, from: Address, assets: u128) -> u128;
    fn withdraw(env: Env, to: Address, assets: u128);
    fn borrow(env: Env, to: Address, amount: u128);
    fn repay(env: Env, from: Address, amount: u128);
    fn get_current_leverage_bps(env: Env) -> u128;
}

#[soroban_sdk::contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    /// Returns `(price, is_alive)`, price in base units per token unit scaled 1e6.
    fn get_asset_price(env: Env, asset: Address) -> (u128, bool);
}

/// Two-phase flash liquidity: `begin_flash_loan` hands out the funds and a
/// ticket, `complete_flash_loan` verifies principal + fee came back.
///
/// Providers must enforce repayment inside the same invocation. A ticket still
/// open when the top-level call ends has to fail that call, so an unrepaid loan
/// never commits.
#[soroban_sdk::contractclient(name = "FlashLiquidityProviderClient")]
pub trait FlashLiquidityProvider {
    fn max_flash_loan(env: Env, token: Address) -> u128;
    fn flash_fee(env: Env, token: Address, amount: u128) -> u128;
    fn begin_flash_loan(env: Env, receiver: Address, token: Address, amount: u128) -> FlashTicket;
    fn complete_flash_loan(env: Env, ticket: FlashTicket) -> bool;
}

#[soroban_sdk::contractclient(name = "SwapVenueClient")]
pub trait SwapVenue {
    fn swap_exact_input(
        env: Env,
        sender: Address,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        min_out: u128,
        payload: Bytes,
    ) -> u128;
    fn swap_exact_output(
        env: Env,
        sender: Address,
        token_in: Address,
        token_out: Address,
        max_in: u128,
        exact_out: u128,
        payload: Bytes,
    ) -> u128;
}

#[soroban_sdk::contractclient(name = "PrincipalTokenClient")]
pub trait PrincipalToken {
    fn maturity(env: Env) -> u64;
}

/// Collapse a `try_` client result into the leg error when the collaborator
/// failed, so the caller can tell which leg aborted the invocation.
pub fn expect_leg<T, C, I>(result: Result<Result<T, C>, I>, leg: LeverageError) -> Result<T, LeverageError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        _ => Err(leg),
    }
}
