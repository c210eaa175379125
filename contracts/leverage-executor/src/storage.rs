use leverage_core::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};
use leverage_core::{LeverageBounds, LeverageError};
use soroban_sdk::{contracttype, Address, Env};

#[contracttype]
pub enum DataKey {
    Admin,
    Initialized,
    Vault(Address), // VaultConfig
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VaultConfig {
    pub oracle: Address,
    pub bounds: LeverageBounds,
}

pub fn require_admin(env: &Env, admin: &Address) -> Result<(), LeverageError> {
    let stored: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .ok_or(LeverageError::NotInitialized)?;
    bump_core_ttl(env);
    if stored != *admin {
        return Err(LeverageError::Unauthorized);
    }
    admin.require_auth();
    Ok(())
}

pub fn get_vault_config(env: &Env, vault: &Address) -> Result<VaultConfig, LeverageError> {
    bump_vault_ttl(env, vault);
    env.storage()
        .persistent()
        .get(&DataKey::Vault(vault.clone()))
        .ok_or(LeverageError::VaultNotRegistered)
}

pub fn set_vault_config(env: &Env, vault: &Address, config: &VaultConfig) {
    env.storage()
        .persistent()
        .set(&DataKey::Vault(vault.clone()), config);
    bump_vault_ttl(env, vault);
}

pub fn has_vault_config(env: &Env, vault: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Vault(vault.clone()))
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    if persistent.has(&DataKey::Admin) {
        persistent.extend_ttl(&DataKey::Admin, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if env.storage().instance().has(&DataKey::Initialized) {
        env.storage()
            .instance()
            .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_vault_ttl(env: &Env, vault: &Address) {
    let key = DataKey::Vault(vault.clone());
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}
