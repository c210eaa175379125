#![no_std]
use leverage_core::constants::BPS;
use leverage_core::FlashTicket;
use soroban_sdk::{contract, contractevent, contractimpl, contracttype, token, Address, Env};

#[contracttype]
enum DataKey {
    Initialized,
    FeeBps,
    NextTicket,
    OpenTickets,
    Ticket(u64),
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlashLoanOpened {
    #[topic]
    pub receiver: Address,
    pub token: Address,
    pub amount: u128,
    pub fee: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlashLoanSettled {
    #[topic]
    pub receiver: Address,
    pub id: u64,
}

/// Two-phase flash lender over its own token balances.
#[contract]
pub struct MockFlashProvider;

#[contractimpl]
impl MockFlashProvider {
    pub fn initialize(env: Env, fee_bps: u128) {
        if env
            .storage()
            .persistent()
            .get::<_, bool>(&DataKey::Initialized)
            .is_some()
        {
            panic!("already initialized");
        }
        env.storage().persistent().set(&DataKey::FeeBps, &fee_bps);
        env.storage().persistent().set(&DataKey::NextTicket, &0u64);
        env.storage().persistent().set(&DataKey::OpenTickets, &0u32);
        env.storage().persistent().set(&DataKey::Initialized, &true);
    }

    pub fn max_flash_loan(env: Env, token: Address) -> u128 {
        balance(&env, &token)
    }

    pub fn flash_fee(env: Env, _token: Address, amount: u128) -> u128 {
        let fee_bps: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::FeeBps)
            .unwrap_or(0u128);
        amount.saturating_mul(fee_bps) / BPS
    }

    pub fn begin_flash_loan(env: Env, receiver: Address, token: Address, amount: u128) -> FlashTicket {
        receiver.require_auth();
        if amount == 0 {
            panic!("bad amount");
        }
        let balance_before = balance(&env, &token);
        if amount > balance_before {
            panic!("insufficient liquidity");
        }
        let id: u64 = env
            .storage()
            .persistent()
            .get(&DataKey::NextTicket)
            .unwrap_or(0u64);
        env.storage().persistent().set(&DataKey::NextTicket, &(id + 1));

        let ticket = FlashTicket {
            id,
            token: token.clone(),
            receiver: receiver.clone(),
            amount,
            fee: Self::flash_fee(env.clone(), token.clone(), amount),
            balance_before,
        };
        env.storage().temporary().set(&DataKey::Ticket(id), &ticket);
        set_open_tickets(&env, open_tickets(&env) + 1);

        token::Client::new(&env, &token).transfer(&env.current_contract_address(), &receiver, &(amount as i128));
        FlashLoanOpened {
            receiver,
            token,
            amount,
            fee: ticket.fee,
        }
        .publish(&env);
        ticket
    }

    /// Principal + fee must already be back in the provider's balance.
    pub fn complete_flash_loan(env: Env, ticket: FlashTicket) -> bool {
        let stored: FlashTicket = env
            .storage()
            .temporary()
            .get(&DataKey::Ticket(ticket.id))
            .expect("unknown ticket");
        if stored != ticket {
            panic!("ticket mismatch");
        }
        if balance(&env, &stored.token) < stored.balance_before.saturating_add(stored.fee) {
            panic!("flash loan not repaid");
        }
        env.storage().temporary().remove(&DataKey::Ticket(stored.id));
        set_open_tickets(&env, open_tickets(&env).saturating_sub(1));
        FlashLoanSettled {
            receiver: stored.receiver,
            id: stored.id,
        }
        .publish(&env);
        true
    }

    pub fn open_tickets(env: Env) -> u32 {
        open_tickets(&env)
    }
}

fn balance(env: &Env, token: &Address) -> u128 {
    let balance = token::Client::new(env, token).balance(&env.current_contract_address());
    if balance < 0 {
        panic!("negative balance");
    }
    balance as u128
}

fn open_tickets(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::OpenTickets)
        .unwrap_or(0u32)
}

fn set_open_tickets(env: &Env, count: u32) {
    env.storage().persistent().set(&DataKey::OpenTickets, &count);
}
