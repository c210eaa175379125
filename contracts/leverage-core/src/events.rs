use soroban_sdk::{contractevent, Address};

use crate::types::{Direction, LeverageBounds};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VaultRegistered {
    #[topic]
    pub vault: Address,
    pub oracle: Address,
    pub bounds: LeverageBounds,
}

/// Funds paid out to the rebalancing caller.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallerSettled {
    #[topic]
    pub caller: Address,
    pub token: Address,
    pub amount: u128,
}

/// Residual collateral returned to the vault after the caller was paid.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeftoverCollateralTransferred {
    #[topic]
    pub token: Address,
    pub amount: u128,
    pub recipient: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RebalanceExecuted {
    #[topic]
    pub vault: Address,
    pub direction: Direction,
    pub amount: u128,
    pub resulting_leverage_bps: u128,
}
