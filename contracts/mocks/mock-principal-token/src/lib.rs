#![no_std]

use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, String};
use stellar_tokens::fungible::Base as TokenBase;

#[contracttype]
enum DataKey {
    Initialized,
    Maturity,
}

/// Fixed-maturity principal token. Speaks the standard token interface
/// and answers `maturity()`, which is how callers tell it from a plain token.
#[contract]
pub struct MockPrincipalToken;

#[contractimpl]
impl MockPrincipalToken {
    pub fn initialize(env: Env, name: String, symbol: String, decimals: u32, maturity: u64) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .is_some()
        {
            panic!("already initialized");
        }
        TokenBase::set_metadata(&env, decimals, name, symbol);
        env.storage().persistent().set(&DataKey::Maturity, &maturity);
        env.storage().persistent().set(&DataKey::Initialized, &true);
    }

    /// Unix timestamp after which the token only redeems.
    pub fn maturity(env: Env) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::Maturity)
            .expect("not initialized")
    }

    pub fn name(env: Env) -> String {
        TokenBase::name(&env)
    }

    pub fn symbol(env: Env) -> String {
        TokenBase::symbol(&env)
    }

    pub fn decimals(env: Env) -> u32 {
        TokenBase::decimals(&env)
    }

    pub fn total_supply(env: Env) -> i128 {
        TokenBase::total_supply(&env)
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        TokenBase::balance(&env, &id)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        TokenBase::allowance(&env, &from, &spender)
    }

    pub fn approve(env: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        if amount < 0 {
            panic!("bad amount");
        }
        TokenBase::approve(&env, &from, &spender, amount, expiration_ledger);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::transfer(&env, &from, &to, amount);
    }

    pub fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::transfer_from(&env, &spender, &from, &to, amount);
    }

    pub fn mint(env: Env, to: Address, amount: i128) {
        if amount <= 0 {
            panic!("bad amount");
        }
        TokenBase::mint(&env, &to, amount);
    }
}
