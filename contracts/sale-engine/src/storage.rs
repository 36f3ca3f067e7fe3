use crate::types::{DataKey, SaleConfig, SaleState};
use shared::errors::Error;
use soroban_sdk::{Address, Env};

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn set_config(env: &Env, config: &SaleConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_config(env: &Env) -> Result<SaleConfig, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn set_state(env: &Env, state: &SaleState) {
    env.storage().instance().set(&DataKey::State, state);
}

pub fn get_state(env: &Env) -> Result<SaleState, Error> {
    env.storage()
        .instance()
        .get(&DataKey::State)
        .ok_or(Error::NotInitialized)
}

pub fn get_investment(env: &Env, investor: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Investment(investor.clone()))
        .unwrap_or(0)
}

/// Store an escrowed amount; zero removes the entry
pub fn set_investment(env: &Env, investor: &Address, amount: i128) {
    let key = DataKey::Investment(investor.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &amount);
    }
}
