use leverage_core::LeverageError;
use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{token, Address, Env, IntoVal, Symbol, Vec};

pub fn to_i128(amount: u128) -> Result<i128, LeverageError> {
    if amount > i128::MAX as u128 {
        return Err(LeverageError::MathOverflow);
    }
    Ok(amount as i128)
}

pub fn balance_of(env: &Env, token: &Address, who: &Address) -> u128 {
    let balance = token::Client::new(env, token).balance(who);
    if balance < 0 {
        panic!("negative balance");
    }
    balance as u128
}

pub fn self_balance(env: &Env, token: &Address) -> u128 {
    balance_of(env, token, &env.current_contract_address())
}

pub fn transfer_out(env: &Env, token: &Address, to: &Address, amount: u128) -> Result<(), LeverageError> {
    if amount == 0 {
        return Ok(());
    }
    token::Client::new(env, token).transfer(&env.current_contract_address(), to, &to_i128(amount)?);
    Ok(())
}

pub fn pull_from(env: &Env, token: &Address, from: &Address, amount: u128) -> Result<(), LeverageError> {
    if amount == 0 {
        return Ok(());
    }
    token::Client::new(env, token).transfer(from, &env.current_contract_address(), &to_i128(amount)?);
    Ok(())
}

/// Pre-authorize the `transfer(self -> to, amount)` a collaborator performs on
/// our behalf one call deeper.
pub fn authorize_transfer_from_self(
    env: &Env,
    token: &Address,
    to: &Address,
    amount: u128,
) -> Result<(), LeverageError> {
    let args = (env.current_contract_address(), to.clone(), to_i128(amount)?).into_val(env);
    let ctx = ContractContext {
        contract: token.clone(),
        fn_name: Symbol::new(env, "transfer"),
        args,
    };
    let mut auths = Vec::new(env);
    auths.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
        context: ctx,
        sub_invocations: Vec::new(env),
    }));
    env.authorize_as_current_contract(auths);
    Ok(())
}

/// Allowance for a venue pulling an amount we only know an upper bound of.
/// Expires this ledger and is revoked right after the leg.
pub fn approve_spender(env: &Env, token: &Address, spender: &Address, amount: u128) -> Result<(), LeverageError> {
    token::Client::new(env, token).approve(
        &env.current_contract_address(),
        spender,
        &to_i128(amount)?,
        &env.ledger().sequence(),
    );
    Ok(())
}

pub fn revoke_spender(env: &Env, token: &Address, spender: &Address) {
    token::Client::new(env, token).approve(
        &env.current_contract_address(),
        spender,
        &0i128,
        &env.ledger().sequence(),
    );
}
