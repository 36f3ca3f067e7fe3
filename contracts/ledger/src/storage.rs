use crate::types::{Account, AllowanceValue, DataKey, LedgerPhase, Role};
use shared::errors::Error;
use soroban_sdk::{Address, Env};

/// Check if the ledger has been initialized
pub fn has_owner(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Owner)
}

pub fn set_owner(env: &Env, owner: &Address) {
    env.storage().instance().set(&DataKey::Owner, owner);
}

pub fn get_owner(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Owner)
        .ok_or(Error::NotInitialized)
}

pub fn set_registry(env: &Env, registry: &Address) {
    env.storage().instance().set(&DataKey::Registry, registry);
}

pub fn get_registry(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Registry)
        .ok_or(Error::NotInitialized)
}

pub fn set_payment_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::PaymentToken, token);
}

pub fn get_payment_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::PaymentToken)
        .ok_or(Error::NotInitialized)
}

pub fn set_role(env: &Env, role: Role, holder: &Address) {
    env.storage().instance().set(&DataKey::Role(role), holder);
}

pub fn get_role(env: &Env, role: Role) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Role(role))
        .ok_or(Error::NotInitialized)
}

/// Store the minter. Callers must check it is not already set.
pub fn set_minter(env: &Env, minter: &Address) {
    env.storage().instance().set(&DataKey::Minter, minter);
}

pub fn get_minter(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Minter)
}

pub fn set_phase(env: &Env, phase: LedgerPhase) {
    env.storage().instance().set(&DataKey::Phase, &phase);
}

pub fn get_phase(env: &Env) -> Result<LedgerPhase, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Phase)
        .ok_or(Error::NotInitialized)
}

pub fn set_total_supply(env: &Env, supply: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &supply);
}

pub fn get_total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

pub fn set_total_profits(env: &Env, total: i128) {
    env.storage().instance().set(&DataKey::TotalProfits, &total);
}

pub fn get_total_profits(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalProfits)
        .unwrap_or(0)
}

/// Retrieve an account record, defaulting to an unused one
pub fn get_account(env: &Env, identity: &Address) -> Account {
    env.storage()
        .persistent()
        .get(&DataKey::Account(identity.clone()))
        .unwrap_or_default()
}

pub fn set_account(env: &Env, identity: &Address, account: &Account) {
    env.storage()
        .persistent()
        .set(&DataKey::Account(identity.clone()), account);
}

/// Remove an account record and hand it to the caller
pub fn take_account(env: &Env, identity: &Address) -> Account {
    let key = DataKey::Account(identity.clone());
    let account: Account = env.storage().persistent().get(&key).unwrap_or_default();
    env.storage().persistent().remove(&key);
    account
}

/// Current allowance; expired entries read as zero
pub fn get_allowance(env: &Env, from: &Address, spender: &Address) -> AllowanceValue {
    let key = DataKey::Allowance(from.clone(), spender.clone());
    match env.storage().persistent().get::<DataKey, AllowanceValue>(&key) {
        Some(allowance) if allowance.expiration_ledger >= env.ledger().sequence() => allowance,
        _ => AllowanceValue {
            amount: 0,
            expiration_ledger: 0,
        },
    }
}

pub fn set_allowance(env: &Env, from: &Address, spender: &Address, allowance: &AllowanceValue) {
    let key = DataKey::Allowance(from.clone(), spender.clone());
    if allowance.amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, allowance);
    }
}
