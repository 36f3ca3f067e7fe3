#![no_std]

use shared::constants::MAX_BATCH_SIZE;
use shared::errors::Error;
use shared::events::{ADMIN_CHANGED, MEMBER_ADDED, MEMBER_REMOVED};
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, Vec};


/// Storage keys for the access registry
#[derive(Clone)]
#[contracttype]
pub enum DataKey {
    /// Admin address
    Admin,
    /// Membership flag keyed by identity
    Member(Address),
}

#[contract]
pub struct AccessRegistry;

#[contractimpl]
impl AccessRegistry {
    /// Initialize the registry with an admin address
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().instance().set(&DataKey::Admin, &admin);
        Ok(())
    }

    /// Add an identity to the allow-list (admin only)
    pub fn add_member(env: Env, admin: Address, identity: Address) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        Self::insert(&env, &identity);
        Ok(())
    }

    /// Add several identities at once (admin only)
    ///
    /// # Arguments
    /// * `identities` - Identities to allow-list, at most `MAX_BATCH_SIZE`
    pub fn add_members(env: Env, admin: Address, identities: Vec<Address>) -> Result<(), Error> {
        if identities.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }
        Self::require_admin(&env, &admin)?;
        for identity in identities.iter() {
            Self::insert(&env, &identity);
        }
        Ok(())
    }

    /// Remove an identity from the allow-list (admin only)
    pub fn remove_member(env: Env, admin: Address, identity: Address) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        let key = DataKey::Member(identity.clone());
        if env.storage().persistent().has(&key) {
            env.storage().persistent().remove(&key);
            env.events().publish((MEMBER_REMOVED,), identity);
        }
        Ok(())
    }

    /// Hand the admin role to another address
    pub fn set_admin(env: Env, admin: Address, new_admin: Address) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        env.storage().instance().set(&DataKey::Admin, &new_admin);
        env.events().publish((ADMIN_CHANGED,), (admin, new_admin));
        Ok(())
    }

    pub fn is_member(env: Env, identity: Address) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::Member(identity))
            .unwrap_or(false)
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        if *caller != admin {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn insert(env: &Env, identity: &Address) {
        let key = DataKey::Member(identity.clone());
        if !env.storage().persistent().has(&key) {
            env.storage().persistent().set(&key, &true);
            env.events().publish((MEMBER_ADDED,), identity.clone());
        }
    }
}
