#![no_std]
use leverage_core::constants::BPS;
use leverage_core::interfaces::PriceOracleClient;
use leverage_core::model;
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env};

#[contracttype]
enum DataKey {
    Initialized,
    Admin,
    Executor,
    CollateralToken,
    DebtToken,
    Oracle,
    MaxLtvBps,
    ExchangeThreshold,
    MaxDeposit,
    CollateralAmount,
    DebtAmount,
}

/// Lending pool holding a single leveraged position on its own books.
/// Only the registered executor may pull collateral out or borrow against it.
#[contract]
pub struct MockLeveragedVault;

#[contractimpl]
impl MockLeveragedVault {
    pub fn initialize(
        env: Env,
        admin: Address,
        collateral_token: Address,
        debt_token: Address,
        oracle: Address,
        max_ltv_bps: u128,
        exchange_threshold: u128,
    ) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .is_some()
        {
            panic!("already initialized");
        }
        if max_ltv_bps == 0 || max_ltv_bps >= BPS {
            panic!("invalid ltv");
        }
        let storage = env.storage().persistent();
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::CollateralToken, &collateral_token);
        storage.set(&DataKey::DebtToken, &debt_token);
        storage.set(&DataKey::Oracle, &oracle);
        storage.set(&DataKey::MaxLtvBps, &max_ltv_bps);
        storage.set(&DataKey::ExchangeThreshold, &exchange_threshold);
        storage.set(&DataKey::MaxDeposit, &u128::MAX);
        storage.set(&DataKey::CollateralAmount, &0u128);
        storage.set(&DataKey::DebtAmount, &0u128);
        storage.set(&DataKey::Initialized, &true);
    }

    pub fn set_executor(env: Env, executor: Address) {
        require_admin(&env);
        env.storage().persistent().set(&DataKey::Executor, &executor);
    }

    pub fn set_max_deposit(env: Env, cap: u128) {
        require_admin(&env);
        env.storage().persistent().set(&DataKey::MaxDeposit, &cap);
    }

    /// Book an existing position. Tokens backing it are expected to already
    /// sit in the vault.
    pub fn open_position(env: Env, collateral: u128, debt: u128) {
        require_admin(&env);
        set_u128(&env, &DataKey::CollateralAmount, collateral);
        set_u128(&env, &DataKey::DebtAmount, debt);
    }

    pub fn collateral_token(env: Env) -> Address {
        get_address(&env, &DataKey::CollateralToken)
    }

    pub fn debt_token(env: Env) -> Address {
        get_address(&env, &DataKey::DebtToken)
    }

    pub fn collateral_amount(env: Env) -> u128 {
        get_u128(&env, &DataKey::CollateralAmount)
    }

    pub fn debt_amount(env: Env) -> u128 {
        get_u128(&env, &DataKey::DebtAmount)
    }

    pub fn exchange_threshold(env: Env) -> u128 {
        get_u128(&env, &DataKey::ExchangeThreshold)
    }

    pub fn max_deposit(env: Env, _account: Address) -> u128 {
        get_u128(&env, &DataKey::MaxDeposit)
    }

    /// `1 / (1 - ltv)` in basis points.
    pub fn max_leverage_bps(env: Env) -> u128 {
        let ltv = get_u128(&env, &DataKey::MaxLtvBps);
        BPS * BPS / (BPS - ltv)
    }

    pub fn preview_deposit(_env: Env, assets: u128) -> u128 {
        assets
    }

    pub fn preview_mint(_env: Env, shares: u128) -> u128 {
        shares
    }

    pub fn deposit(env: Env, from: Address, assets: u128) -> u128 {
        from.require_auth();
        if assets == 0 {
            panic!("bad amount");
        }
        if assets > get_u128(&env, &DataKey::MaxDeposit) {
            panic!("deposit cap");
        }
        let token = get_address(&env, &DataKey::CollateralToken);
        token::Client::new(&env, &token).transfer(&from, &env.current_contract_address(), &to_i128(assets));
        let collateral = get_u128(&env, &DataKey::CollateralAmount).saturating_add(assets);
        set_u128(&env, &DataKey::CollateralAmount, collateral);
        assets
    }

    pub fn withdraw(env: Env, to: Address, assets: u128) {
        require_executor(&env);
        let collateral = get_u128(&env, &DataKey::CollateralAmount);
        if assets == 0 || assets > collateral {
            panic!("bad amount");
        }
        let remaining = collateral - assets;
        check_ltv(&env, remaining, get_u128(&env, &DataKey::DebtAmount));
        set_u128(&env, &DataKey::CollateralAmount, remaining);
        let token = get_address(&env, &DataKey::CollateralToken);
        token::Client::new(&env, &token).transfer(&env.current_contract_address(), &to, &to_i128(assets));
    }

    pub fn borrow(env: Env, to: Address, amount: u128) {
        require_executor(&env);
        if amount == 0 {
            panic!("bad amount");
        }
        let debt = get_u128(&env, &DataKey::DebtAmount).saturating_add(amount);
        check_ltv(&env, get_u128(&env, &DataKey::CollateralAmount), debt);
        set_u128(&env, &DataKey::DebtAmount, debt);
        let token = get_address(&env, &DataKey::DebtToken);
        token::Client::new(&env, &token).transfer(&env.current_contract_address(), &to, &to_i128(amount));
    }

    pub fn repay(env: Env, from: Address, amount: u128) {
        from.require_auth();
        let debt = get_u128(&env, &DataKey::DebtAmount);
        if amount == 0 || amount > debt {
            panic!("repay exceeds debt");
        }
        let token = get_address(&env, &DataKey::DebtToken);
        token::Client::new(&env, &token).transfer(&from, &env.current_contract_address(), &to_i128(amount));
        set_u128(&env, &DataKey::DebtAmount, debt - amount);
    }

    pub fn get_current_leverage_bps(env: Env) -> u128 {
        let (collateral_value, debt_value) = position_values(
            &env,
            get_u128(&env, &DataKey::CollateralAmount),
            get_u128(&env, &DataKey::DebtAmount),
        );
        model::current_leverage_bps(collateral_value, debt_value).expect("no leverage")
    }
}

fn require_admin(env: &Env) {
    get_address(env, &DataKey::Admin).require_auth();
}

fn require_executor(env: &Env) {
    let executor: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Executor)
        .expect("executor not set");
    executor.require_auth();
}

fn position_values(env: &Env, collateral: u128, debt: u128) -> (u128, u128) {
    let oracle = PriceOracleClient::new(env, &get_address(env, &DataKey::Oracle));
    let (collateral_price, _) = oracle.get_asset_price(&get_address(env, &DataKey::CollateralToken));
    let (debt_price, _) = oracle.get_asset_price(&get_address(env, &DataKey::DebtToken));
    (
        model::value_base(collateral, collateral_price).expect("overflow"),
        model::value_base(debt, debt_price).expect("overflow"),
    )
}

fn check_ltv(env: &Env, collateral: u128, debt: u128) {
    if debt == 0 {
        return;
    }
    let (collateral_value, debt_value) = position_values(env, collateral, debt);
    let ltv = get_u128(env, &DataKey::MaxLtvBps);
    if debt_value.saturating_mul(BPS) > collateral_value.saturating_mul(ltv) {
        panic!("exceeds max leverage");
    }
}

fn get_address(env: &Env, key: &DataKey) -> Address {
    env.storage().persistent().get(key).expect("not initialized")
}

fn get_u128(env: &Env, key: &DataKey) -> u128 {
    env.storage().persistent().get(key).unwrap_or(0u128)
}

fn set_u128(env: &Env, key: &DataKey, value: u128) {
    env.storage().persistent().set(key, &value);
}

fn to_i128(amount: u128) -> i128 {
    if amount > i128::MAX as u128 {
        panic!("amount overflow");
    }
    amount as i128
}
