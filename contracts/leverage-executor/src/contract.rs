use leverage_core::events::VaultRegistered;
use leverage_core::market::read_market_state;
use leverage_core::model::validate_bounds;
use leverage_core::{quoter, LeverageBounds, LeverageError, RebalanceOutcome, RebalanceQuote, SwapInstruction};
use soroban_sdk::{contract, contractimpl, Address, Env};

use crate::decrease;
use crate::increase;
use crate::storage::*;

#[contract]
pub struct LeverageExecutor;

#[contractimpl]
impl LeverageExecutor {
    pub fn initialize(env: Env, admin: Address) -> Result<(), LeverageError> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(LeverageError::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().persistent().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Initialized, &true);
        bump_core_ttl(&env);
        Ok(())
    }

    /// Bind a vault to its oracle and leverage corridor. Bounds are fixed
    /// once registered.
    pub fn register_vault(
        env: Env,
        admin: Address,
        vault: Address,
        oracle: Address,
        bounds: LeverageBounds,
    ) -> Result<(), LeverageError> {
        require_admin(&env, &admin)?;
        validate_bounds(&bounds)?;
        if has_vault_config(&env, &vault) {
            return Err(LeverageError::VaultAlreadyRegistered);
        }
        set_vault_config(
            &env,
            &vault,
            &VaultConfig {
                oracle: oracle.clone(),
                bounds: bounds.clone(),
            },
        );
        VaultRegistered {
            vault,
            oracle,
            bounds,
        }
        .publish(&env);
        Ok(())
    }

    pub fn vault_config(env: Env, vault: Address) -> Option<VaultConfig> {
        get_vault_config(&env, &vault).ok()
    }

    pub fn current_leverage_bps(env: Env, vault: Address) -> Result<u128, LeverageError> {
        let config = get_vault_config(&env, &vault)?;
        read_market_state(&env, &vault, &config.oracle)?
            .position()?
            .leverage_bps()
    }

    /// Read-only quote against live pool balances and oracle prices.
    pub fn quote(env: Env, vault: Address) -> Result<RebalanceQuote, LeverageError> {
        let config = get_vault_config(&env, &vault)?;
        let state = read_market_state(&env, &vault, &config.oracle)?;
        quoter::quote(&state, &config.bounds)
    }

    pub fn increase_leverage(
        env: Env,
        caller: Address,
        vault: Address,
        flash_provider: Address,
        caller_contribution: u128,
        swap: SwapInstruction,
    ) -> Result<RebalanceOutcome, LeverageError> {
        bump_core_ttl(&env);
        increase::increase_leverage(&env, &caller, &vault, &flash_provider, caller_contribution, &swap)
    }

    pub fn decrease_leverage(
        env: Env,
        caller: Address,
        vault: Address,
        flash_provider: Address,
        caller_debt_contribution: u128,
        min_output_collateral: u128,
        swap: SwapInstruction,
    ) -> Result<RebalanceOutcome, LeverageError> {
        bump_core_ttl(&env);
        decrease::decrease_leverage(
            &env,
            &caller,
            &vault,
            &flash_provider,
            caller_debt_contribution,
            min_output_collateral,
            &swap,
        )
    }
}
