#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

#[contracttype]
enum DataKey {
    Price(Address),
}

#[contracttype]
#[derive(Clone)]
struct PriceEntry {
    price: u128,
    alive: bool,
}

/// Settable oracle. Prices are base units per token unit scaled 1e6.
#[contract]
pub struct MockPriceOracle;

#[contractimpl]
impl MockPriceOracle {
    pub fn set_price(env: Env, asset: Address, price: u128) {
        env.storage()
            .persistent()
            .set(&DataKey::Price(asset), &PriceEntry { price, alive: true });
    }

    pub fn set_alive(env: Env, asset: Address, alive: bool) {
        let mut entry = get_entry(&env, &asset);
        entry.alive = alive;
        env.storage().persistent().set(&DataKey::Price(asset), &entry);
    }

    pub fn get_asset_price(env: Env, asset: Address) -> (u128, bool) {
        let entry = get_entry(&env, &asset);
        (entry.price, entry.alive)
    }
}

fn get_entry(env: &Env, asset: &Address) -> PriceEntry {
    env.storage()
        .persistent()
        .get(&DataKey::Price(asset.clone()))
        .expect("price not set")
}
