use soroban_sdk::{Address, Env};

use crate::errors::LeverageError;
use crate::interfaces::{expect_leg, PoolAdapterClient, PriceOracleClient};
use crate::types::MarketState;

/// Collateral/debt balances of the vault's position.
pub trait ReserveLookup {
    fn collateral_token(&self) -> Address;
    fn debt_token(&self) -> Address;
    fn reserves(&self) -> Result<(u128, u128), LeverageError>;
    fn max_leverage_bps(&self) -> Result<u128, LeverageError>;
}

pub trait AssetPricing {
    fn price(&self, asset: &Address) -> Result<u128, LeverageError>;
}

impl ReserveLookup for PoolAdapterClient<'_> {
    fn collateral_token(&self) -> Address {
        PoolAdapterClient::collateral_token(self)
    }

    fn debt_token(&self) -> Address {
        PoolAdapterClient::debt_token(self)
    }

    fn reserves(&self) -> Result<(u128, u128), LeverageError> {
        let collateral = expect_leg(self.try_collateral_amount(), LeverageError::PoolLegFailed)?;
        let debt = expect_leg(self.try_debt_amount(), LeverageError::PoolLegFailed)?;
        Ok((collateral, debt))
    }

    fn max_leverage_bps(&self) -> Result<u128, LeverageError> {
        expect_leg(self.try_max_leverage_bps(), LeverageError::PoolLegFailed)
    }
}

impl AssetPricing for PriceOracleClient<'_> {
    fn price(&self, asset: &Address) -> Result<u128, LeverageError> {
        let (price, is_alive) = expect_leg(self.try_get_asset_price(asset), LeverageError::OracleLegFailed)?;
        if !is_alive || price == 0 {
            return Err(LeverageError::StalePrice);
        }
        Ok(price)
    }
}

pub fn snapshot<R: ReserveLookup, P: AssetPricing>(reserves: &R, pricing: &P) -> Result<MarketState, LeverageError> {
    let (collateral_amount, debt_amount) = reserves.reserves()?;
    Ok(MarketState {
        collateral_amount,
        debt_amount,
        collateral_price: pricing.price(&reserves.collateral_token())?,
        debt_price: pricing.price(&reserves.debt_token())?,
        max_leverage_bps: reserves.max_leverage_bps()?,
    })
}

pub fn read_market_state(env: &Env, vault: &Address, oracle: &Address) -> Result<MarketState, LeverageError> {
    snapshot(
        &PoolAdapterClient::new(env, vault),
        &PriceOracleClient::new(env, oracle),
    )
}
