use soroban_sdk::{contracttype, Address, Bytes, Vec};

use crate::errors::LeverageError;
use crate::model;

/// Leverage corridor configured per vault. All values in basis points,
/// `10_000` == 1x.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeverageBounds {
    pub target_bps: u128,
    pub lower_bound_bps: u128,
    pub upper_bound_bps: u128,
    pub max_subsidy_bps: u128,
    /// Leverage at which the decrease-side subsidy saturates.
    pub subsidy_ceiling_bps: u128,
}

/// Projection of a vault's leveraged state in base units.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    pub collateral_value_base: u128,
    pub debt_value_base: u128,
}

impl Position {
    pub fn leverage_bps(&self) -> Result<u128, LeverageError> {
        model::current_leverage_bps(self.collateral_value_base, self.debt_value_base)
    }

    pub fn equity_base(&self) -> u128 {
        self.collateral_value_base
            .saturating_sub(self.debt_value_base)
    }
}

/// Market snapshot read once per invocation and handed to the model and the
/// quoter. Prices are base units per token unit, scaled 1e6.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketState {
    pub collateral_amount: u128,
    pub debt_amount: u128,
    pub collateral_price: u128,
    pub debt_price: u128,
    /// Hard leverage limit of the pool; 0 when the pool reports none.
    pub max_leverage_bps: u128,
}

impl MarketState {
    pub fn position(&self) -> Result<Position, LeverageError> {
        Ok(Position {
            collateral_value_base: model::value_base(
                self.collateral_amount,
                self.collateral_price,
            )?,
            debt_value_base: model::value_base(self.debt_amount, self.debt_price)?,
        })
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Direction {
    None = 0,
    Increase = 1,
    Decrease = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RebalanceQuote {
    pub required_debt_token_amount: u128,
    pub direction: Direction,
    pub estimated_subsidy_bps: u128,
    pub current_leverage_bps: u128,
}

impl RebalanceQuote {
    pub fn none(current_leverage_bps: u128) -> Self {
        RebalanceQuote {
            required_debt_token_amount: 0,
            direction: Direction::None,
            estimated_subsidy_bps: 0,
            current_leverage_bps,
        }
    }
}

/// Caller-built swap leg. `limit` is the minimum output for exact-input
/// swaps and the maximum input for exact-output swaps; `amount` caps the
/// swap size the executor may perform. `payload` is handed to the venue as-is.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwapInstruction {
    pub venue: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount: u128,
    pub limit: u128,
    pub payload: Bytes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlashLoanRequest {
    pub token: Address,
    pub amount: u128,
    pub fee: u128,
}

/// Handle for an open flash loan. Returned by `begin_flash_loan` and
/// surrendered to `complete_flash_loan` once principal + fee are back.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlashTicket {
    pub id: u64,
    pub token: Address,
    pub receiver: Address,
    pub amount: u128,
    pub fee: u128,
    pub balance_before: u128,
}

impl FlashTicket {
    pub fn owed(&self) -> u128 {
        self.amount.saturating_add(self.fee)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Plain,
    /// Principal token with its maturity timestamp.
    PrincipalToken(u64),
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum SettlementStep {
    PulledFromCaller = 0,
    FlashBorrowed = 1,
    Swapped = 2,
    PoolSupplied = 3,
    PoolBorrowed = 4,
    PoolRepaid = 5,
    PoolWithdrawn = 6,
    FlashRepaid = 7,
    CallerPaid = 8,
    LeftoverSwept = 9,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RebalanceOutcome {
    pub direction: Direction,
    pub amount: u128,
    /// Debt tokens the call started with: prefunded balance plus the pull.
    pub caller_funded: u128,
    pub flash_borrowed: u128,
    pub flash_fee: u128,
    pub swap_spent: u128,
    pub swap_received: u128,
    /// Collateral withdrawn on a decrease, debt borrowed on an increase.
    pub pool_received: u128,
    pub caller_collateral_payout: u128,
    pub caller_debt_payout: u128,
    pub swept_to_vault: u128,
    pub starting_leverage_bps: u128,
    pub resulting_leverage_bps: u128,
    pub trail: Vec<SettlementStep>,
}
