use super::*;
use leverage_core::events::{CallerSettled, LeftoverCollateralTransferred, RebalanceExecuted};
use leverage_core::{Direction, LeverageBounds, LeverageError, SettlementStep, SwapInstruction};
use mock_flash_provider::{MockFlashProvider, MockFlashProviderClient};
use mock_leveraged_vault::{MockLeveragedVault, MockLeveragedVaultClient};
use mock_price_oracle::{MockPriceOracle, MockPriceOracleClient};
use mock_principal_token::{MockPrincipalToken, MockPrincipalTokenClient};
use mock_swap_venue::{MockSwapVenue, MockSwapVenueClient};
use soroban_sdk::testutils::{Address as _, Events, Ledger};
use soroban_sdk::{token, vec, Address, Bytes, Env, Event, String, Vec};

const UNIT: u128 = 1_000_000;
const VENUE_FEE_BPS: u128 = 30;

struct Config {
    flash_fee_bps: u128,
    flash_liquidity: u128,
    exchange_threshold: u128,
    max_ltv_bps: u128,
    pt_maturity: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            flash_fee_bps: 9,
            flash_liquidity: 1_000 * UNIT,
            exchange_threshold: 1_000,
            max_ltv_bps: 9_000,
            pt_maturity: None,
        }
    }
}

struct Harness<'a> {
    env: &'a Env,
    admin: Address,
    caller: Address,
    executor: LeverageExecutorClient<'a>,
    vault: MockLeveragedVaultClient<'a>,
    oracle: MockPriceOracleClient<'a>,
    flash: MockFlashProviderClient<'a>,
    venue: MockSwapVenueClient<'a>,
    collateral: token::Client<'a>,
    debt: token::Client<'a>,
    collateral_is_pt: bool,
}

impl<'a> Harness<'a> {
    fn mint_collateral(&self, to: &Address, amount: u128) {
        if self.collateral_is_pt {
            MockPrincipalTokenClient::new(self.env, &self.collateral.address).mint(to, &(amount as i128));
        } else {
            token::StellarAssetClient::new(self.env, &self.collateral.address).mint(to, &(amount as i128));
        }
    }

    fn mint_debt(&self, to: &Address, amount: u128) {
        token::StellarAssetClient::new(self.env, &self.debt.address).mint(to, &(amount as i128));
    }

    fn set_collateral_price(&self, price: u128) {
        self.oracle.set_price(&self.collateral.address, &price);
    }

    /// Sell collateral for debt, used by decreases.
    fn sell_collateral(&self, amount: u128, max_in: u128) -> SwapInstruction {
        SwapInstruction {
            venue: self.venue.address.clone(),
            token_in: self.collateral.address.clone(),
            token_out: self.debt.address.clone(),
            amount,
            limit: max_in,
            payload: Bytes::new(self.env),
        }
    }

    /// Buy collateral with debt, used by increases.
    fn buy_collateral(&self, amount: u128, min_out: u128) -> SwapInstruction {
        SwapInstruction {
            venue: self.venue.address.clone(),
            token_in: self.debt.address.clone(),
            token_out: self.collateral.address.clone(),
            amount,
            limit: min_out,
            payload: Bytes::new(self.env),
        }
    }

    fn assert_executor_empty(&self) {
        assert_eq!(self.collateral.balance(&self.executor.address), 0);
        assert_eq!(self.debt.balance(&self.executor.address), 0);
    }
}

fn bounds() -> LeverageBounds {
    LeverageBounds {
        target_bps: 30_000,
        lower_bound_bps: 20_000,
        upper_bound_bps: 40_000,
        max_subsidy_bps: 100,
        subsidy_ceiling_bps: 80_000,
    }
}

fn setup(env: &Env) -> Harness<'_> {
    setup_with(env, Config::default())
}

/// 3x position: 300 collateral against 200 debt, both priced at 1.0.
fn setup_with(env: &Env, config: Config) -> Harness<'_> {
    env.mock_all_auths();
    let admin = Address::generate(env);
    let caller = Address::generate(env);

    let debt_id = env.register_stellar_asset_contract_v2(admin.clone()).address();
    let collateral_id = match config.pt_maturity {
        Some(maturity) => {
            let id = env.register(MockPrincipalToken, ());
            MockPrincipalTokenClient::new(env, &id).initialize(
                &String::from_str(env, "PT Collateral"),
                &String::from_str(env, "PT-COL"),
                &6,
                &maturity,
            );
            id
        }
        None => env.register_stellar_asset_contract_v2(admin.clone()).address(),
    };

    let oracle_id = env.register(MockPriceOracle, ());
    let oracle = MockPriceOracleClient::new(env, &oracle_id);
    oracle.set_price(&debt_id, &UNIT);
    oracle.set_price(&collateral_id, &UNIT);

    let vault_id = env.register(MockLeveragedVault, ());
    let vault = MockLeveragedVaultClient::new(env, &vault_id);
    vault.initialize(
        &admin,
        &collateral_id,
        &debt_id,
        &oracle_id,
        &config.max_ltv_bps,
        &config.exchange_threshold,
    );

    let executor_id = env.register(LeverageExecutor, ());
    let executor = LeverageExecutorClient::new(env, &executor_id);
    executor.initialize(&admin);
    executor.register_vault(&admin, &vault_id, &oracle_id, &bounds());
    vault.set_executor(&executor_id);

    let flash_id = env.register(MockFlashProvider, ());
    let flash = MockFlashProviderClient::new(env, &flash_id);
    flash.initialize(&config.flash_fee_bps);

    let venue_id = env.register(MockSwapVenue, ());
    let venue = MockSwapVenueClient::new(env, &venue_id);
    venue.initialize(&oracle_id, &VENUE_FEE_BPS);

    let h = Harness {
        env,
        admin,
        caller,
        executor,
        vault,
        oracle,
        flash,
        venue,
        collateral: token::Client::new(env, &collateral_id),
        debt: token::Client::new(env, &debt_id),
        collateral_is_pt: config.pt_maturity.is_some(),
    };

    h.mint_collateral(&vault_id, 300 * UNIT);
    h.mint_debt(&vault_id, 1_000 * UNIT);
    h.vault.open_position(&(300 * UNIT), &(200 * UNIT));

    h.mint_debt(&flash_id, config.flash_liquidity);
    h.mint_debt(&venue_id, 1_000 * UNIT);
    h.mint_collateral(&venue_id, 1_000 * UNIT);
    h.mint_debt(&h.caller, 500 * UNIT);
    h
}

// ---------------------------------------------------------------------------
// configuration
// ---------------------------------------------------------------------------

#[test]
fn registered_vault_is_readable() {
    let env = Env::default();
    let h = setup(&env);
    let config = h.executor.vault_config(&h.vault.address).unwrap();
    assert_eq!(config.oracle, h.oracle.address);
    assert_eq!(config.bounds, bounds());
    assert_eq!(h.executor.vault_config(&Address::generate(&env)), None);
    assert_eq!(h.executor.current_leverage_bps(&h.vault.address), 30_000);
}

#[test]
fn initialize_twice_fails() {
    let env = Env::default();
    let h = setup(&env);
    assert_eq!(
        h.executor.try_initialize(&h.admin),
        Err(Ok(LeverageError::AlreadyInitialized))
    );
}

#[test]
fn register_vault_checks_admin_and_bounds() {
    let env = Env::default();
    let h = setup(&env);
    let vault = Address::generate(&env);

    assert_eq!(
        h.executor
            .try_register_vault(&Address::generate(&env), &vault, &h.oracle.address, &bounds()),
        Err(Ok(LeverageError::Unauthorized))
    );

    let mut bad = bounds();
    bad.upper_bound_bps = bad.target_bps;
    assert_eq!(
        h.executor.try_register_vault(&h.admin, &vault, &h.oracle.address, &bad),
        Err(Ok(LeverageError::InvalidBoundsConfiguration))
    );

    assert_eq!(
        h.executor
            .try_register_vault(&h.admin, &h.vault.address, &h.oracle.address, &bounds()),
        Err(Ok(LeverageError::VaultAlreadyRegistered))
    );
}

#[test]
fn unregistered_vault_is_rejected() {
    let env = Env::default();
    let h = setup(&env);
    let stranger = Address::generate(&env);
    assert_eq!(
        h.executor.try_quote(&stranger),
        Err(Ok(LeverageError::VaultNotRegistered))
    );
    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &stranger,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 0),
        ),
        Err(Ok(LeverageError::VaultNotRegistered))
    );
}

// ---------------------------------------------------------------------------
// quotes
// ---------------------------------------------------------------------------

#[test]
fn quote_tracks_oracle_price() {
    let env = Env::default();
    let h = setup(&env);
    assert_eq!(h.executor.quote(&h.vault.address).direction, Direction::None);

    h.set_collateral_price(800_000);
    let q = h.executor.quote(&h.vault.address);
    assert_eq!(q.direction, Direction::Decrease);
    assert_eq!(q.required_debt_token_amount, 120 * UNIT);
    assert_eq!(q.estimated_subsidy_bps, 50);
    assert_eq!(q.current_leverage_bps, 60_000);

    h.set_collateral_price(1_500_000);
    let q = h.executor.quote(&h.vault.address);
    assert_eq!(q.direction, Direction::Increase);
    assert_eq!(q.required_debt_token_amount, 300 * UNIT);
    assert_eq!(q.estimated_subsidy_bps, 20);
}

#[test]
fn stale_price_halts_everything() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);
    h.oracle.set_alive(&h.collateral.address, &false);

    assert_eq!(
        h.executor.try_quote(&h.vault.address),
        Err(Ok(LeverageError::StalePrice))
    );
    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &(120 * UNIT),
            &0,
            &h.sell_collateral(0, 0),
        ),
        Err(Ok(LeverageError::StalePrice))
    );
    assert_eq!(h.debt.balance(&h.caller), 500 * UNIT as i128);
}

// ---------------------------------------------------------------------------
// decrease
// ---------------------------------------------------------------------------

#[test]
fn decrease_half_flash_funded() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(60 * UNIT),
        &(75 * UNIT),
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );

    assert_eq!(outcome.direction, Direction::Decrease);
    assert_eq!(outcome.amount, 120 * UNIT);
    assert_eq!(outcome.caller_funded, 60 * UNIT);
    assert_eq!(outcome.flash_borrowed, 60 * UNIT);
    assert_eq!(outcome.flash_fee, 54_000);
    assert_eq!(outcome.pool_received, 150_750_000);
    assert_eq!(outcome.swap_spent, 75_293_381);
    assert_eq!(outcome.swap_received, 60_054_000);
    // 60 debt funded at 0.8 plus 0.5% subsidy
    assert_eq!(outcome.caller_collateral_payout, 75_375_000);
    assert_eq!(outcome.caller_debt_payout, 0);
    // 150.75 withdrawn - 75.293381 sold - 75.375 paid
    assert_eq!(outcome.swept_to_vault, 81_619);
    assert_eq!(outcome.starting_leverage_bps, 60_000);
    assert_eq!(outcome.resulting_leverage_bps, 30_270);
    assert_eq!(
        outcome.trail,
        vec![
            &env,
            SettlementStep::PulledFromCaller,
            SettlementStep::FlashBorrowed,
            SettlementStep::PoolRepaid,
            SettlementStep::PoolWithdrawn,
            SettlementStep::Swapped,
            SettlementStep::FlashRepaid,
            SettlementStep::CallerPaid,
            SettlementStep::LeftoverSwept,
        ]
    );

    assert_eq!(h.vault.debt_amount(), 80 * UNIT);
    assert_eq!(h.vault.collateral_amount(), 149_331_619);
    assert_eq!(h.debt.balance(&h.caller), 440 * UNIT as i128);
    assert_eq!(h.collateral.balance(&h.caller), 75_375_000);
    assert_eq!(h.debt.balance(&h.flash.address), (1_000 * UNIT + 54_000) as i128);
    assert_eq!(h.flash.open_tickets(), 0);
    h.assert_executor_empty();
}

#[test]
fn decrease_fully_caller_funded_skips_flash_and_swap() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    // swap leg is never touched, so an empty instruction is fine
    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(120 * UNIT),
        &0,
        &h.sell_collateral(0, 0),
    );

    assert_eq!(outcome.flash_borrowed, 0);
    assert_eq!(outcome.flash_fee, 0);
    assert_eq!(outcome.caller_collateral_payout, 150_750_000);
    assert_eq!(outcome.swept_to_vault, 0);
    assert_eq!(outcome.resulting_leverage_bps, 30_304);
    assert_eq!(
        outcome.trail,
        vec![
            &env,
            SettlementStep::PulledFromCaller,
            SettlementStep::PoolRepaid,
            SettlementStep::PoolWithdrawn,
            SettlementStep::CallerPaid,
        ]
    );
    assert_eq!(h.debt.balance(&h.flash.address), (1_000 * UNIT) as i128);
    h.assert_executor_empty();
}

#[test]
fn decrease_returns_excess_contribution() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(130 * UNIT),
        &0,
        &h.sell_collateral(0, 0),
    );
    assert_eq!(outcome.caller_collateral_payout, 150_750_000);
    assert_eq!(outcome.caller_debt_payout, 10 * UNIT);
    assert_eq!(h.debt.balance(&h.caller), 380 * UNIT as i128);
    h.assert_executor_empty();
}

#[test]
fn prefunded_balance_is_credited_once() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);
    h.mint_debt(&h.executor.address, 60 * UNIT);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &0,
        &0,
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );
    // only the shortfall beyond what the executor already held is borrowed
    assert_eq!(outcome.caller_funded, 60 * UNIT);
    assert_eq!(outcome.flash_borrowed, 60 * UNIT);
    assert_eq!(outcome.caller_collateral_payout, 75_375_000);
    assert_eq!(h.debt.balance(&h.caller), 500 * UNIT as i128);
    h.assert_executor_empty();
}

#[test]
fn dust_leftover_goes_to_caller() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            exchange_threshold: 100_000,
            ..Config::default()
        },
    );
    h.set_collateral_price(800_000);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(60 * UNIT),
        &0,
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );
    assert_eq!(outcome.swept_to_vault, 0);
    assert_eq!(outcome.caller_collateral_payout, 75_375_000 + 81_619);
    assert_eq!(h.vault.collateral_amount(), 149_250_000);
    h.assert_executor_empty();
}

#[test]
fn leftover_over_deposit_cap_still_goes_to_vault() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);
    h.vault.set_max_deposit(&1);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(60 * UNIT),
        &(75 * UNIT),
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );
    // payout stays at the entitlement, the leftover is transferred not deposited
    assert_eq!(outcome.caller_collateral_payout, 75_375_000);
    assert_eq!(outcome.swept_to_vault, 81_619);
    assert_eq!(outcome.resulting_leverage_bps, 30_304);
    assert_eq!(outcome.trail.last(), Some(SettlementStep::LeftoverSwept));
    assert_eq!(h.collateral.balance(&h.caller), 75_375_000);
    assert_eq!(h.vault.collateral_amount(), 149_250_000);
    assert_eq!(h.collateral.balance(&h.vault.address), 149_331_619);
    h.assert_executor_empty();
}

#[test]
fn decrease_events_follow_settlement_order() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(60 * UNIT),
        &(75 * UNIT),
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );

    let mut emitted = Vec::new(&env);
    for event in env.events().all().iter() {
        if event.0 == h.executor.address {
            emitted.push_back(event);
        }
    }
    assert!(emitted.len() >= 3);
    let tail = emitted.slice(emitted.len() - 3..);

    let paid = CallerSettled {
        caller: h.caller.clone(),
        token: h.collateral.address.clone(),
        amount: 75_375_000,
    };
    let swept = LeftoverCollateralTransferred {
        token: h.collateral.address.clone(),
        amount: 81_619,
        recipient: h.vault.address.clone(),
    };
    let executed = RebalanceExecuted {
        vault: h.vault.address.clone(),
        direction: Direction::Decrease,
        amount: 120 * UNIT,
        resulting_leverage_bps: 30_270,
    };
    assert_eq!(
        tail,
        vec![
            &env,
            (h.executor.address.clone(), paid.topics(&env), paid.data(&env)),
            (h.executor.address.clone(), swept.topics(&env), swept.data(&env)),
            (h.executor.address.clone(), executed.topics(&env), executed.data(&env)),
        ]
    );
}

#[test]
fn decrease_is_idempotent_once_in_bounds() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);
    h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(120 * UNIT),
        &0,
        &h.sell_collateral(0, 0),
    );

    let second = h.executor.try_decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(120 * UNIT),
        &0,
        &h.sell_collateral(0, 0),
    );
    assert_eq!(second, Err(Ok(LeverageError::NoRebalanceNeeded)));
    assert!(LeverageError::NoRebalanceNeeded.is_decline());
}

#[test]
fn decrease_inside_bounds_declines() {
    let env = Env::default();
    let h = setup(&env);
    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &0,
            &h.sell_collateral(0, 0),
        ),
        Err(Ok(LeverageError::NoRebalanceNeeded))
    );
}

#[test]
fn decrease_below_min_output_rolls_back() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &(60 * UNIT),
            &(76 * UNIT),
            &h.sell_collateral(70 * UNIT, 76 * UNIT),
        ),
        Err(Ok(LeverageError::InsufficientOutput))
    );
    assert_eq!(h.vault.debt_amount(), 200 * UNIT);
    assert_eq!(h.vault.collateral_amount(), 300 * UNIT);
    assert_eq!(h.debt.balance(&h.caller), 500 * UNIT as i128);
    assert_eq!(h.flash.open_tickets(), 0);
    h.assert_executor_empty();
}

#[test]
fn decrease_swap_cannot_eat_caller_entitlement() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    // venue needs ~75.29 in, the cap leaves it 70
    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &(60 * UNIT),
            &0,
            &h.sell_collateral(70 * UNIT, 70 * UNIT),
        ),
        Err(Ok(LeverageError::SwapLegFailed))
    );
    assert_eq!(h.vault.debt_amount(), 200 * UNIT);
}

#[test]
fn decrease_instruction_too_small_for_flash_leg() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);

    // principal 60 plus fee 0.054 does not fit a 60 cap
    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &(60 * UNIT),
            &0,
            &h.sell_collateral(60 * UNIT, 76 * UNIT),
        ),
        Err(Ok(LeverageError::QuoteExceedsInstruction))
    );
}

#[test]
fn decrease_without_flash_liquidity_fails() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            flash_liquidity: 10 * UNIT,
            ..Config::default()
        },
    );
    h.set_collateral_price(800_000);

    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &(60 * UNIT),
            &0,
            &h.sell_collateral(70 * UNIT, 76 * UNIT),
        ),
        Err(Ok(LeverageError::FlashLiquidityUnavailable))
    );
    assert_eq!(h.debt.balance(&h.caller), 500 * UNIT as i128);
}

#[test]
fn decrease_rejects_increase_quote() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);
    assert_eq!(
        h.executor.try_decrease_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &0,
            &h.sell_collateral(0, 0),
        ),
        Err(Ok(LeverageError::WrongDirection))
    );
}

// ---------------------------------------------------------------------------
// increase
// ---------------------------------------------------------------------------

#[test]
fn increase_flash_funded() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);

    let outcome = h.executor.increase_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &0,
        &h.buy_collateral(300 * UNIT, 199 * UNIT),
    );

    assert_eq!(outcome.direction, Direction::Increase);
    assert_eq!(outcome.amount, 300 * UNIT);
    assert_eq!(outcome.flash_borrowed, 300 * UNIT);
    assert_eq!(outcome.flash_fee, 270_000);
    assert_eq!(outcome.swap_spent, 300 * UNIT);
    assert_eq!(outcome.swap_received, 199_400_000);
    assert_eq!(outcome.pool_received, 300_600_000);
    // borrowed 300.6 (0.2% subsidy), repaid 300.27
    assert_eq!(outcome.caller_debt_payout, 330_000);
    assert_eq!(outcome.caller_collateral_payout, 0);
    assert_eq!(outcome.starting_leverage_bps, 18_000);
    assert_eq!(outcome.resulting_leverage_bps, 30_144);
    assert_eq!(
        outcome.trail,
        vec![
            &env,
            SettlementStep::FlashBorrowed,
            SettlementStep::Swapped,
            SettlementStep::PoolSupplied,
            SettlementStep::PoolBorrowed,
            SettlementStep::FlashRepaid,
            SettlementStep::CallerPaid,
        ]
    );

    assert_eq!(h.vault.collateral_amount(), 499_400_000);
    assert_eq!(h.vault.debt_amount(), 500_600_000);
    assert_eq!(h.debt.balance(&h.caller), (500 * UNIT + 330_000) as i128);
    assert_eq!(h.flash.open_tickets(), 0);
    h.assert_executor_empty();
}

#[test]
fn increase_settles_by_measured_output_when_venue_misreports() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);
    h.venue.set_misreport(&true);

    let outcome = h.executor.increase_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &0,
        &h.buy_collateral(300 * UNIT, 199 * UNIT),
    );
    assert_eq!(outcome.resulting_leverage_bps, 30_144);
    assert_eq!(h.vault.collateral_amount(), 499_400_000);
    h.assert_executor_empty();
}

#[test]
fn increase_short_delivery_is_slippage() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);
    h.venue.set_short_delivery_bps(&100);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::SlippageExceeded))
    );
    assert_eq!(h.vault.collateral_amount(), 300 * UNIT);
    assert_eq!(h.flash.open_tickets(), 0);
}

#[test]
fn increase_flash_fee_beyond_subsidy_fails_and_rolls_back() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            flash_fee_bps: 100,
            ..Config::default()
        },
    );
    h.set_collateral_price(1_500_000);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 0),
        ),
        Err(Ok(LeverageError::InsufficientRepayment))
    );
    assert_eq!(h.vault.collateral_amount(), 300 * UNIT);
    assert_eq!(h.vault.debt_amount(), 200 * UNIT);
    assert_eq!(h.debt.balance(&h.flash.address), (1_000 * UNIT) as i128);
    assert_eq!(h.flash.open_tickets(), 0);
    h.assert_executor_empty();
}

#[test]
fn increase_contribution_covers_costly_flash_fee() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            flash_fee_bps: 100,
            ..Config::default()
        },
    );
    h.set_collateral_price(1_500_000);

    let outcome = h.executor.increase_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(3 * UNIT),
        &h.buy_collateral(300 * UNIT, 199 * UNIT),
    );
    assert_eq!(outcome.flash_borrowed, 297 * UNIT);
    assert_eq!(outcome.flash_fee, 2_970_000);
    // 300.6 borrowed - 299.97 owed
    assert_eq!(outcome.caller_debt_payout, 630_000);
    assert_eq!(h.debt.balance(&h.caller), (497 * UNIT + 630_000) as i128);
    h.assert_executor_empty();
}

#[test]
fn increase_fully_caller_funded_skips_flash() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);

    let outcome = h.executor.increase_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(301 * UNIT),
        &h.buy_collateral(300 * UNIT, 199 * UNIT),
    );
    assert_eq!(outcome.caller_funded, 301 * UNIT);
    assert_eq!(outcome.flash_borrowed, 0);
    assert_eq!(outcome.flash_fee, 0);
    assert_eq!(outcome.swap_spent, 300 * UNIT);
    // 1 unspent + 300.6 borrowed
    assert_eq!(outcome.caller_debt_payout, 301_600_000);
    assert_eq!(outcome.resulting_leverage_bps, 30_144);
    assert_eq!(
        outcome.trail,
        vec![
            &env,
            SettlementStep::PulledFromCaller,
            SettlementStep::Swapped,
            SettlementStep::PoolSupplied,
            SettlementStep::PoolBorrowed,
            SettlementStep::CallerPaid,
        ]
    );
    assert_eq!(h.debt.balance(&h.caller), 500_600_000);
    assert_eq!(h.debt.balance(&h.flash.address), (1_000 * UNIT) as i128);
    assert_eq!(h.flash.open_tickets(), 0);
    h.assert_executor_empty();
}

#[test]
fn increase_with_deposits_disabled_declines() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);
    h.vault.set_max_deposit(&0);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::DepositsDisabled))
    );
    assert!(LeverageError::DepositsDisabled.is_decline());
}

#[test]
fn increase_over_deposit_cap_fails() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);
    h.vault.set_max_deposit(&(100 * UNIT));

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::DepositCapExceeded))
    );
}

#[test]
fn increase_instruction_checks() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(1_500_000);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(299 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::QuoteExceedsInstruction))
    );
    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.sell_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::SwapInstructionMismatch))
    );
}

#[test]
fn increase_rejects_decrease_quote() {
    let env = Env::default();
    let h = setup(&env);
    h.set_collateral_price(800_000);
    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 0),
        ),
        Err(Ok(LeverageError::WrongDirection))
    );
}

#[test]
fn increase_pool_refusal_names_pool_leg() {
    let env = Env::default();
    // 60% max LTV cannot carry the ~67% LTV the target implies
    let h = setup_with(
        &env,
        Config {
            max_ltv_bps: 6_000,
            ..Config::default()
        },
    );
    h.set_collateral_price(1_500_000);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::PoolLegFailed))
    );
    assert_eq!(h.vault.debt_amount(), 200 * UNIT);
}

// ---------------------------------------------------------------------------
// principal tokens
// ---------------------------------------------------------------------------

#[test]
fn principal_token_before_maturity_is_bought() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            pt_maturity: Some(10_000),
            ..Config::default()
        },
    );
    env.ledger().with_mut(|li| li.timestamp = 5_000);
    h.set_collateral_price(1_500_000);

    let outcome = h.executor.increase_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &0,
        &h.buy_collateral(300 * UNIT, 199 * UNIT),
    );
    assert_eq!(outcome.resulting_leverage_bps, 30_144);
    h.assert_executor_empty();
}

#[test]
fn matured_principal_token_cannot_be_bought() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            pt_maturity: Some(10_000),
            ..Config::default()
        },
    );
    env.ledger().with_mut(|li| li.timestamp = 10_000);
    h.set_collateral_price(1_500_000);

    assert_eq!(
        h.executor.try_increase_leverage(
            &h.caller,
            &h.vault.address,
            &h.flash.address,
            &0,
            &h.buy_collateral(300 * UNIT, 199 * UNIT),
        ),
        Err(Ok(LeverageError::PrincipalTokenMatured))
    );
}

#[test]
fn matured_principal_token_can_still_be_sold() {
    let env = Env::default();
    let h = setup_with(
        &env,
        Config {
            pt_maturity: Some(10_000),
            ..Config::default()
        },
    );
    env.ledger().with_mut(|li| li.timestamp = 20_000);
    h.set_collateral_price(800_000);

    let outcome = h.executor.decrease_leverage(
        &h.caller,
        &h.vault.address,
        &h.flash.address,
        &(60 * UNIT),
        &0,
        &h.sell_collateral(70 * UNIT, 76 * UNIT),
    );
    assert_eq!(outcome.resulting_leverage_bps, 30_270);
    h.assert_executor_empty();
}
