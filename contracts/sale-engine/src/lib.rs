#![no_std]

use shared::{
    constants::{MAX_BATCH_SIZE, RATE_CHANGE_FACTOR},
    errors::Error,
    events::*,
    interfaces::{AccessRegistryClient, LedgerClient},
    math,
};
use soroban_sdk::{contract, contractimpl, log, token::TokenClient, Address, Env, Vec};

mod storage;
mod types;

#[cfg(test)]
mod tests;

use storage::*;
pub use types::{Pool, SaleConfig, SaleOutcome, SalePhase, SaleState};

#[contract]
pub struct SaleEngineContract;

#[contractimpl]
impl SaleEngineContract {
    /// Initialize the sale
    ///
    /// The ledger must have no minter yet, or already name this contract. A
    /// non-zero reserve must go to an allow-listed account.
    ///
    /// # Arguments
    /// * `config` - Schedule, pricing, caps, goal and payout accounts
    pub fn initialize(env: Env, config: SaleConfig) -> Result<(), Error> {
        if has_config(&env) {
            return Err(Error::AlreadyInitialized);
        }
        config.owner.require_auth();

        match LedgerClient::new(&env, &config.ledger).minter() {
            Some(minter) if minter != env.current_contract_address() => {
                return Err(Error::TokenAlreadyBound);
            }
            _ => {}
        }

        if config.cap_public <= 0 || config.cap_private <= 0 {
            return Err(Error::InvalidInput);
        }
        if config.token_price <= 0 || config.exchange_rate <= 0 {
            return Err(Error::InvalidInput);
        }
        if config.goal < 0 || config.reserve_amount < 0 {
            return Err(Error::InvalidInput);
        }
        let total_cap = math::add(config.cap_public, config.cap_private)?;
        if config.goal > total_cap {
            return Err(Error::GoalUnattainable);
        }
        if config.opening_time <= env.ledger().timestamp()
            || config.closing_time <= config.opening_time
        {
            return Err(Error::InvalidSchedule);
        }
        if config.reserve_amount > 0
            && !AccessRegistryClient::new(&env, &config.registry).is_member(&config.reserve_account)
        {
            return Err(Error::NotMember);
        }

        set_state(
            &env,
            &SaleState {
                rate_admin: config.rate_admin.clone(),
                exchange_rate: config.exchange_rate,
                sold_public: 0,
                sold_private: 0,
                total_escrowed: 0,
                outcome: None,
            },
        );
        set_config(&env, &config);

        Ok(())
    }

    // ==================== Rate management ====================

    /// Replace the rate admin (owner only)
    pub fn set_rate_admin(env: Env, owner: Address, rate_admin: Address) -> Result<(), Error> {
        let config = get_config(&env)?;
        Self::require_owner(&config, &owner)?;

        let mut state = get_state(&env)?;
        if state.rate_admin == rate_admin {
            return Ok(());
        }
        let old = state.rate_admin.clone();
        state.rate_admin = rate_admin.clone();
        set_state(&env, &state);

        env.events().publish((RATE_ADMIN_CHANGED,), (old, rate_admin));
        Ok(())
    }

    /// Adjust the exchange rate by at most one order of magnitude
    pub fn set_rate(env: Env, rate_admin: Address, new_rate: i128) -> Result<(), Error> {
        let mut state = get_state(&env)?;
        if rate_admin != state.rate_admin {
            return Err(Error::Unauthorized);
        }
        rate_admin.require_auth();

        let old = state.exchange_rate;
        let ceiling = old.checked_mul(RATE_CHANGE_FACTOR).unwrap_or(i128::MAX);
        if new_rate <= 0 || new_rate < old / RATE_CHANGE_FACTOR || new_rate > ceiling {
            return Err(Error::RateChangeTooLarge);
        }

        state.exchange_rate = new_rate;
        set_state(&env, &state);

        env.events().publish((RATE_CHANGED,), (old, new_rate));
        Ok(())
    }

    // ==================== Distribution ====================

    /// Allocate tokens from the public pool without payment (owner only)
    pub fn distribute_via_public_sale(
        env: Env,
        owner: Address,
        beneficiaries: Vec<Address>,
        amounts: Vec<i128>,
    ) -> Result<(), Error> {
        Self::distribute(&env, &owner, Pool::Public, &beneficiaries, &amounts)
    }

    /// Allocate tokens from the private pool without payment (owner only)
    pub fn distribute_via_private_sale(
        env: Env,
        owner: Address,
        beneficiaries: Vec<Address>,
        amounts: Vec<i128>,
    ) -> Result<(), Error> {
        Self::distribute(&env, &owner, Pool::Private, &beneficiaries, &amounts)
    }

    // ==================== Purchase ====================

    /// Buy tokens from the public pool with `value` units of the payment token
    ///
    /// While the goal has not been reached the payment stays in escrow here,
    /// afterwards it goes straight to the treasury. The purchase that crosses
    /// the goal is still escrowed.
    ///
    /// # Returns
    /// * Number of tokens minted to the buyer
    pub fn purchase(env: Env, buyer: Address, value: i128) -> Result<i128, Error> {
        buyer.require_auth();

        let config = get_config(&env)?;
        let mut state = get_state(&env)?;
        if SalePhase::at(&config, &state, env.ledger().timestamp()) != SalePhase::Open {
            return Err(Error::SaleNotOpen);
        }
        if !AccessRegistryClient::new(&env, &config.registry).is_member(&buyer) {
            return Err(Error::NotMember);
        }
        if value <= 0 {
            return Err(Error::InvalidInput);
        }

        let amount = math::mul_div(value, state.exchange_rate, config.token_price)?;
        if amount == 0 {
            return Err(Error::InvalidInput);
        }
        let sold_public = math::add(state.sold_public, amount)?;
        if sold_public > config.cap_public {
            return Err(Error::CapExceeded);
        }

        let sold_before = math::add(state.sold_public, state.sold_private)?;
        let payment = TokenClient::new(&env, &config.payment_token);
        if sold_before < config.goal {
            payment.transfer(&buyer, &env.current_contract_address(), &value);
            let invested = math::add(get_investment(&env, &buyer), value)?;
            set_investment(&env, &buyer, invested);
            state.total_escrowed = math::add(state.total_escrowed, value)?;
        } else {
            payment.transfer(&buyer, &config.treasury, &value);
        }

        LedgerClient::new(&env, &config.ledger).mint(
            &env.current_contract_address(),
            &buyer,
            &amount,
        );
        state.sold_public = sold_public;
        set_state(&env, &state);

        env.events().publish((PURCHASED,), (buyer, value, amount));
        Ok(amount)
    }

    // ==================== Finalization ====================

    /// Close out the sale after `closing_time` (owner only)
    ///
    /// Goal met: mint the reserve, fix the ledger supply and sweep escrow to
    /// the treasury. Goal missed: disable the ledger and open refunds.
    ///
    /// The reserve account is checked against the registry at `initialize`;
    /// if it is removed from the allow-list afterwards, a goal-met finalize
    /// fails until it is added back.
    pub fn finalize(env: Env, owner: Address) -> Result<SaleOutcome, Error> {
        let config = get_config(&env)?;
        Self::require_owner(&config, &owner)?;

        let mut state = get_state(&env)?;
        match SalePhase::at(&config, &state, env.ledger().timestamp()) {
            SalePhase::Finalized(_) => return Err(Error::AlreadyFinalized),
            SalePhase::Pending | SalePhase::Open => return Err(Error::SaleNotClosed),
            SalePhase::Closed => {}
        }

        let sold = math::add(state.sold_public, state.sold_private)?;
        let ledger = LedgerClient::new(&env, &config.ledger);
        let this = env.current_contract_address();

        let outcome = if sold >= config.goal {
            // Minting closes with finish_minting, so the reserve goes first
            if config.reserve_amount > 0 {
                ledger.mint(&this, &config.reserve_account, &config.reserve_amount);
            }
            ledger.finish_minting(&this);

            if state.total_escrowed > 0 {
                TokenClient::new(&env, &config.payment_token).transfer(
                    &this,
                    &config.treasury,
                    &state.total_escrowed,
                );
                state.total_escrowed = 0;
            }
            SaleOutcome::GoalMet
        } else {
            ledger.disable(&this);
            SaleOutcome::GoalMissed
        };

        state.outcome = Some(outcome);
        set_state(&env, &state);

        let goal_met = outcome == SaleOutcome::GoalMet;
        log!(&env, "sale finalized", goal_met, sold);
        env.events().publish((FINALIZED,), goal_met);
        Ok(outcome)
    }

    // ==================== Refunds ====================

    /// Return the caller's escrowed payment after a missed goal
    pub fn claim_refund(env: Env, investor: Address) -> Result<i128, Error> {
        investor.require_auth();
        let mut state = get_state(&env)?;
        Self::require_refundable(&state)?;

        let config = get_config(&env)?;
        let paid = Self::refund(&env, &config, &mut state, &investor)?;
        set_state(&env, &state);
        Ok(paid)
    }

    /// Refund a batch of investors (owner only)
    ///
    /// # Returns
    /// * Total amount refunded
    pub fn distribute_refunds(
        env: Env,
        owner: Address,
        investors: Vec<Address>,
    ) -> Result<i128, Error> {
        if investors.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }
        let config = get_config(&env)?;
        Self::require_owner(&config, &owner)?;
        let mut state = get_state(&env)?;
        Self::require_refundable(&state)?;

        let mut total: i128 = 0;
        for investor in investors.iter() {
            let paid = Self::refund(&env, &config, &mut state, &investor)?;
            total = math::add(total, paid)?;
        }
        set_state(&env, &state);
        Ok(total)
    }

    // ==================== Reads ====================

    pub fn config(env: Env) -> Result<SaleConfig, Error> {
        get_config(&env)
    }

    pub fn state(env: Env) -> Result<SaleState, Error> {
        get_state(&env)
    }

    pub fn phase(env: Env) -> Result<SalePhase, Error> {
        Ok(SalePhase::at(
            &get_config(&env)?,
            &get_state(&env)?,
            env.ledger().timestamp(),
        ))
    }

    pub fn rate(env: Env) -> Result<i128, Error> {
        Ok(get_state(&env)?.exchange_rate)
    }

    pub fn rate_admin(env: Env) -> Result<Address, Error> {
        Ok(get_state(&env)?.rate_admin)
    }

    pub fn remaining_public(env: Env) -> Result<i128, Error> {
        math::sub(get_config(&env)?.cap_public, get_state(&env)?.sold_public)
    }

    pub fn remaining_private(env: Env) -> Result<i128, Error> {
        math::sub(get_config(&env)?.cap_private, get_state(&env)?.sold_private)
    }

    /// Seconds until `closing_time`, zero once closed
    pub fn time_remaining(env: Env) -> Result<u64, Error> {
        Ok(get_config(&env)?
            .closing_time
            .saturating_sub(env.ledger().timestamp()))
    }

    pub fn goal_reached(env: Env) -> Result<bool, Error> {
        let state = get_state(&env)?;
        Ok(math::add(state.sold_public, state.sold_private)? >= get_config(&env)?.goal)
    }

    pub fn is_finalized(env: Env) -> Result<bool, Error> {
        Ok(get_state(&env)?.outcome.is_some())
    }

    pub fn total_escrowed(env: Env) -> Result<i128, Error> {
        Ok(get_state(&env)?.total_escrowed)
    }

    /// Payment currently escrowed for `investor`; zero once swept to treasury
    pub fn investment(env: Env, investor: Address) -> Result<i128, Error> {
        if get_state(&env)?.outcome == Some(SaleOutcome::GoalMet) {
            return Ok(0);
        }
        Ok(get_investment(&env, &investor))
    }

    // ==================== Internal ====================

    fn require_owner(config: &SaleConfig, caller: &Address) -> Result<(), Error> {
        if *caller != config.owner {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn require_refundable(state: &SaleState) -> Result<(), Error> {
        match state.outcome {
            None => Err(Error::NotFinalized),
            Some(SaleOutcome::GoalMet) => Err(Error::GoalWasReached),
            Some(SaleOutcome::GoalMissed) => Ok(()),
        }
    }

    fn distribute(
        env: &Env,
        owner: &Address,
        pool: Pool,
        beneficiaries: &Vec<Address>,
        amounts: &Vec<i128>,
    ) -> Result<(), Error> {
        let config = get_config(env)?;
        Self::require_owner(&config, owner)?;
        let mut state = get_state(env)?;
        if state.outcome.is_some() {
            return Err(Error::AlreadyFinalized);
        }
        if beneficiaries.len() != amounts.len() {
            return Err(Error::LengthMismatch);
        }
        if beneficiaries.len() > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }

        let mut requested: i128 = 0;
        for amount in amounts.iter() {
            math::require_non_negative(amount)?;
            requested = math::add(requested, amount)?;
        }

        let (sold, cap) = match pool {
            Pool::Public => (state.sold_public, config.cap_public),
            Pool::Private => (state.sold_private, config.cap_private),
        };
        let sold = math::add(sold, requested)?;
        if sold > cap {
            return Err(Error::CapExceeded);
        }

        let ledger = LedgerClient::new(env, &config.ledger);
        let this = env.current_contract_address();
        for (beneficiary, amount) in beneficiaries.iter().zip(amounts.iter()) {
            ledger.mint(&this, &beneficiary, &amount);
            env.events()
                .publish((TOKEN_DISTRIBUTED, pool), (beneficiary, amount));
        }

        match pool {
            Pool::Public => state.sold_public = sold,
            Pool::Private => state.sold_private = sold,
        }
        set_state(env, &state);
        Ok(())
    }

    fn refund(
        env: &Env,
        config: &SaleConfig,
        state: &mut SaleState,
        investor: &Address,
    ) -> Result<i128, Error> {
        let amount = get_investment(env, investor);
        if amount > 0 {
            set_investment(env, investor, 0);
            state.total_escrowed = math::sub(state.total_escrowed, amount)?;
            TokenClient::new(env, &config.payment_token).transfer(
                &env.current_contract_address(),
                investor,
                &amount,
            );
        }

        env.events()
            .publish((REFUNDED,), (investor.clone(), amount));
        Ok(amount)
    }
}
