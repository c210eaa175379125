#![no_std]
use leverage_core::constants::{BPS, SCALE_1E6};
use leverage_core::interfaces::PriceOracleClient;
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Bytes, Env};

#[contracttype]
enum DataKey {
    Initialized,
    Oracle,
    FeeBps,
    Misreport,
    ShortDeliveryBps,
}

/// Swaps at oracle prices minus a flat fee, out of its own inventory.
/// Can be switched to misreport its fills or to short-deliver output.
#[contract]
pub struct MockSwapVenue;

#[contractimpl]
impl MockSwapVenue {
    pub fn initialize(env: Env, oracle: Address, fee_bps: u128) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .is_some()
        {
            panic!("already initialized");
        }
        if fee_bps >= BPS {
            panic!("invalid fee");
        }
        env.storage().persistent().set(&DataKey::Oracle, &oracle);
        env.storage().persistent().set(&DataKey::FeeBps, &fee_bps);
        env.storage().persistent().set(&DataKey::Initialized, &true);
    }

    /// Return the requested figure instead of the executed one.
    pub fn set_misreport(env: Env, misreport: bool) {
        env.storage().persistent().set(&DataKey::Misreport, &misreport);
    }

    /// Deliver this share less output than quoted, after the min-out check.
    pub fn set_short_delivery_bps(env: Env, bps: u128) {
        if bps > BPS {
            panic!("invalid bps");
        }
        env.storage().persistent().set(&DataKey::ShortDeliveryBps, &bps);
    }

    pub fn quote_exact_input(env: Env, token_in: Address, token_out: Address, amount_in: u128) -> u128 {
        let (price_in, price_out) = prices(&env, &token_in, &token_out);
        let value = amount_in.saturating_mul(price_in) / SCALE_1E6;
        let gross_out = value.saturating_mul(SCALE_1E6) / price_out;
        gross_out.saturating_mul(BPS - fee_bps(&env)) / BPS
    }

    pub fn quote_exact_output(env: Env, token_in: Address, token_out: Address, amount_out: u128) -> u128 {
        let (price_in, price_out) = prices(&env, &token_in, &token_out);
        let value = ceil_div(amount_out.saturating_mul(price_out), SCALE_1E6);
        let gross_in = ceil_div(value.saturating_mul(SCALE_1E6), price_in);
        ceil_div(gross_in.saturating_mul(BPS), BPS - fee_bps(&env))
    }

    pub fn swap_exact_input(
        env: Env,
        sender: Address,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        min_out: u128,
        _payload: Bytes,
    ) -> u128 {
        sender.require_auth();
        let out = Self::quote_exact_input(env.clone(), token_in.clone(), token_out.clone(), amount_in);
        if out < min_out {
            panic!("slippage");
        }
        settle(&env, &sender, &token_in, &token_out, amount_in, shorted(&env, out));
        if misreport(&env) {
            return amount_in;
        }
        out
    }

    pub fn swap_exact_output(
        env: Env,
        sender: Address,
        token_in: Address,
        token_out: Address,
        max_in: u128,
        exact_out: u128,
        _payload: Bytes,
    ) -> u128 {
        sender.require_auth();
        let amount_in = Self::quote_exact_output(env.clone(), token_in.clone(), token_out.clone(), exact_out);
        if amount_in > max_in {
            panic!("excessive input");
        }
        settle(&env, &sender, &token_in, &token_out, amount_in, shorted(&env, exact_out));
        if misreport(&env) {
            return exact_out;
        }
        amount_in
    }
}

fn settle(env: &Env, sender: &Address, token_in: &Address, token_out: &Address, amount_in: u128, amount_out: u128) {
    let venue = env.current_contract_address();
    if amount_in > 0 {
        token::Client::new(env, token_in).transfer_from(&venue, sender, &venue, &(amount_in as i128));
    }
    if amount_out > 0 {
        token::Client::new(env, token_out).transfer(&venue, sender, &(amount_out as i128));
    }
}

fn prices(env: &Env, token_in: &Address, token_out: &Address) -> (u128, u128) {
    let oracle_id: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Oracle)
        .expect("oracle not set");
    let oracle = PriceOracleClient::new(env, &oracle_id);
    let (price_in, _) = oracle.get_asset_price(token_in);
    let (price_out, _) = oracle.get_asset_price(token_out);
    if price_in == 0 || price_out == 0 {
        panic!("no price");
    }
    (price_in, price_out)
}

fn fee_bps(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::FeeBps)
        .unwrap_or(0u128)
}

fn misreport(env: &Env) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Misreport)
        .unwrap_or(false)
}

fn shorted(env: &Env, amount: u128) -> u128 {
    let bps: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::ShortDeliveryBps)
        .unwrap_or(0u128);
    amount - amount.saturating_mul(bps) / BPS
}

fn ceil_div(a: u128, b: u128) -> u128 {
    if a == 0 {
        return 0;
    }
    (a - 1) / b + 1
}
