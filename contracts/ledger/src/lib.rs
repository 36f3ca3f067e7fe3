#![no_std]

use shared::{
    errors::Error,
    events::*,
    interfaces::AccessRegistryClient,
    math,
};
use soroban_sdk::{contract, contractimpl, log, token::TokenClient, Address, Env, String, Vec};
use soroban_token_sdk::{metadata::TokenMetadata, TokenUtils};

mod profit;
mod storage;
mod types;


use storage::*;
pub use types::{Account, AllowanceValue, LedgerConfig, LedgerPhase, Role};

#[contract]
pub struct LedgerContract;

#[contractimpl]
impl LedgerContract {
    /// Initialize the ledger in its minting phase
    ///
    /// # Arguments
    /// * `config` - Owner, collaborators, profit roles and token metadata
    pub fn initialize(env: Env, config: LedgerConfig) -> Result<(), Error> {
        if has_owner(&env) {
            return Err(Error::AlreadyInitialized);
        }
        config.owner.require_auth();

        if config.decimals > 18 {
            return Err(Error::InvalidInput);
        }

        set_owner(&env, &config.owner);
        set_registry(&env, &config.registry);
        set_payment_token(&env, &config.payment_token);
        set_role(&env, Role::ProfitDepositor, &config.profit_depositor);
        set_role(&env, Role::ProfitDistributor, &config.profit_distributor);
        set_role(&env, Role::RecoveryAgent, &config.recovery_agent);
        set_phase(&env, LedgerPhase::Minting);
        set_total_supply(&env, 0);
        set_total_profits(&env, 0);

        TokenUtils::new(&env).metadata().set_metadata(&TokenMetadata {
            decimal: config.decimals,
            name: config.name,
            symbol: config.symbol,
        });

        Ok(())
    }

    // ==================== Minting ====================

    /// Bind the minter. Can only happen once.
    pub fn set_minter(env: Env, owner: Address, minter: Address) -> Result<(), Error> {
        Self::require_owner(&env, &owner)?;
        get_phase(&env)?.require_active()?;

        if get_minter(&env).is_some() {
            return Err(Error::AlreadySet);
        }
        set_minter(&env, &minter);

        env.events().publish((MINTER_SET,), minter);
        Ok(())
    }

    /// Credit newly created tokens to an allow-listed identity
    pub fn mint(env: Env, minter: Address, to: Address, amount: i128) -> Result<(), Error> {
        get_phase(&env)?.require_minting()?;
        Self::require_minter(&env, &minter)?;
        math::require_non_negative(amount)?;
        Self::require_member(&env, &to)?;

        let mut account = get_account(&env, &to);
        account.balance = math::add(account.balance, amount)?;
        let supply = math::add(get_total_supply(&env), amount)?;

        set_account(&env, &to, &account);
        set_total_supply(&env, supply);

        TokenUtils::new(&env).events().mint(minter, to, amount);
        Ok(())
    }

    /// Fix the supply and turn on transfers and profit accounting
    pub fn finish_minting(env: Env, minter: Address) -> Result<(), Error> {
        let next = get_phase(&env)?.finish_minting()?;
        Self::require_minter(&env, &minter)?;
        set_phase(&env, next);

        log!(&env, "minting finished", get_total_supply(&env));
        env.events().publish((MINTING_FINISHED,), ());
        Ok(())
    }

    /// Permanently deactivate the ledger. Used when the sale misses its goal.
    ///
    /// Profits deposited while minting can no longer be withdrawn, so the
    /// ledger's whole payment-token balance goes back to the owner.
    pub fn disable(env: Env, minter: Address) -> Result<(), Error> {
        let next = get_phase(&env)?.disable()?;
        Self::require_minter(&env, &minter)?;
        set_phase(&env, next);

        let payment = TokenClient::new(&env, &get_payment_token(&env)?);
        let this = env.current_contract_address();
        let held = payment.balance(&this);
        if held > 0 {
            payment.transfer(&this, &get_owner(&env)?, &held);
        }

        log!(&env, "ledger disabled", held);
        env.events().publish((LEDGER_DISABLED,), ());
        Ok(())
    }

    // ==================== Transfers ====================

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        get_phase(&env)?.require_fixed_supply()?;
        math::require_non_negative(amount)?;
        Self::require_member(&env, &from)?;
        Self::require_member(&env, &to)?;

        Self::move_balance(&env, &from, &to, amount)?;

        TokenUtils::new(&env).events().transfer(from, to, amount);
        Ok(())
    }

    /// Allow `spender` to move up to `amount` of `from`'s tokens until
    /// `expiration_ledger`
    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), Error> {
        from.require_auth();
        get_phase(&env)?.require_fixed_supply()?;
        math::require_non_negative(amount)?;
        if amount > 0 && expiration_ledger < env.ledger().sequence() {
            return Err(Error::InvalidInput);
        }
        Self::require_member(&env, &from)?;
        Self::require_member(&env, &spender)?;

        set_allowance(
            &env,
            &from,
            &spender,
            &AllowanceValue {
                amount,
                expiration_ledger,
            },
        );

        TokenUtils::new(&env)
            .events()
            .approve(from, spender, amount, expiration_ledger);
        Ok(())
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        spender.require_auth();
        get_phase(&env)?.require_fixed_supply()?;
        math::require_non_negative(amount)?;
        Self::require_member(&env, &from)?;
        Self::require_member(&env, &to)?;

        let mut allowance = get_allowance(&env, &from, &spender);
        if allowance.amount < amount {
            return Err(Error::InsufficientAllowance);
        }
        allowance.amount = math::sub(allowance.amount, amount)?;
        set_allowance(&env, &from, &spender, &allowance);

        Self::move_balance(&env, &from, &to, amount)?;

        TokenUtils::new(&env).events().transfer(from, to, amount);
        Ok(())
    }

    // ==================== Profit distribution ====================

    /// Pull `amount` of the payment token from the depositor into the pool
    pub fn deposit_profit(env: Env, depositor: Address, amount: i128) -> Result<(), Error> {
        get_phase(&env)?.require_active()?;
        Self::require_role(&env, Role::ProfitDepositor, &depositor)?;
        math::require_non_negative(amount)?;

        let total = math::add(get_total_profits(&env), amount)?;
        if amount > 0 {
            TokenClient::new(&env, &get_payment_token(&env)?).transfer(
                &depositor,
                &env.current_contract_address(),
                &amount,
            );
        }
        set_total_profits(&env, total);

        env.events().publish((PROFIT_DEPOSITED,), (depositor, amount));
        Ok(())
    }

    /// Profit owed to `identity`, settled or not
    pub fn profit_share_owing(env: Env, identity: Address) -> Result<i128, Error> {
        profit::owing(
            &get_account(&env, &identity),
            get_total_profits(&env),
            get_total_supply(&env),
        )
    }

    /// Persist the lazily accrued share of `identity`. Anyone may call this.
    pub fn update_profit_share(env: Env, identity: Address) -> Result<i128, Error> {
        get_phase(&env)?.require_fixed_supply()?;
        let account = Self::settle(&env, &identity)?;
        Ok(account.settled_share)
    }

    pub fn withdraw_profit_share(env: Env, caller: Address) -> Result<i128, Error> {
        caller.require_auth();
        Self::pay_out(&env, &caller, &caller)
    }

    pub fn withdraw_profit_share_to(
        env: Env,
        caller: Address,
        beneficiary: Address,
    ) -> Result<i128, Error> {
        caller.require_auth();
        Self::pay_out(&env, &caller, &beneficiary)
    }

    /// Pay every listed identity its share (profit distributor only)
    ///
    /// The batch is atomic: if any payout fails, the whole call reverts and
    /// nobody in the list is paid.
    ///
    /// # Returns
    /// * Total amount paid out
    pub fn withdraw_profit_shares(
        env: Env,
        distributor: Address,
        identities: Vec<Address>,
    ) -> Result<i128, Error> {
        if identities.len() > shared::MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }
        Self::require_role(&env, Role::ProfitDistributor, &distributor)?;

        let mut total: i128 = 0;
        for identity in identities.iter() {
            let paid = Self::pay_out(&env, &identity, &identity)?;
            total = math::add(total, paid)?;
        }
        Ok(total)
    }

    // ==================== Key recovery ====================

    /// Move the whole account record of `old` to the unused `new` identity
    pub fn recover_key(env: Env, agent: Address, old: Address, new: Address) -> Result<(), Error> {
        get_phase(&env)?.require_active()?;
        Self::require_role(&env, Role::RecoveryAgent, &agent)?;
        if old == new {
            return Err(Error::InvalidInput);
        }
        Self::require_member(&env, &old)?;
        Self::require_member(&env, &new)?;

        if !get_account(&env, &new).is_unused() {
            return Err(Error::AddressInUse);
        }

        let record = take_account(&env, &old);
        set_account(&env, &new, &record);

        log!(&env, "key recovered", old, new);
        env.events().publish((KEY_RECOVERED,), (old, new));
        Ok(())
    }

    // ==================== Role maintenance ====================

    pub fn set_profit_depositor(env: Env, owner: Address, depositor: Address) -> Result<(), Error> {
        Self::replace_role(&env, &owner, Role::ProfitDepositor, &depositor)
    }

    pub fn set_profit_distributor(
        env: Env,
        owner: Address,
        distributor: Address,
    ) -> Result<(), Error> {
        Self::replace_role(&env, &owner, Role::ProfitDistributor, &distributor)
    }

    pub fn set_recovery_agent(env: Env, owner: Address, agent: Address) -> Result<(), Error> {
        Self::replace_role(&env, &owner, Role::RecoveryAgent, &agent)
    }

    // ==================== Reads ====================

    pub fn balance(env: Env, id: Address) -> i128 {
        get_account(&env, &id).balance
    }

    pub fn account(env: Env, id: Address) -> Account {
        get_account(&env, &id)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        get_allowance(&env, &from, &spender).amount
    }

    pub fn total_supply(env: Env) -> i128 {
        get_total_supply(&env)
    }

    pub fn total_profits_deposited(env: Env) -> i128 {
        get_total_profits(&env)
    }

    pub fn phase(env: Env) -> Result<LedgerPhase, Error> {
        get_phase(&env)
    }

    pub fn minting_finished(env: Env) -> Result<bool, Error> {
        Ok(get_phase(&env)? != LedgerPhase::Minting)
    }

    pub fn minter(env: Env) -> Option<Address> {
        get_minter(&env)
    }

    pub fn owner(env: Env) -> Result<Address, Error> {
        get_owner(&env)
    }

    pub fn role(env: Env, role: Role) -> Result<Address, Error> {
        get_role(&env, role)
    }

    pub fn decimals(env: Env) -> u32 {
        TokenUtils::new(&env).metadata().get_metadata().decimal
    }

    pub fn name(env: Env) -> String {
        TokenUtils::new(&env).metadata().get_metadata().name
    }

    pub fn symbol(env: Env) -> String {
        TokenUtils::new(&env).metadata().get_metadata().symbol
    }

    // ==================== Internal ====================

    fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
        if *caller != get_owner(env)? {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn require_minter(env: &Env, caller: &Address) -> Result<(), Error> {
        let minter = get_minter(env).ok_or(Error::MinterNotSet)?;
        if *caller != minter {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn require_role(env: &Env, role: Role, caller: &Address) -> Result<(), Error> {
        if *caller != get_role(env, role)? {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    /// Membership is read fresh from the registry on every call
    fn require_member(env: &Env, identity: &Address) -> Result<(), Error> {
        let registry = AccessRegistryClient::new(env, &get_registry(env)?);
        if !registry.is_member(identity) {
            return Err(Error::NotMember);
        }
        Ok(())
    }

    fn replace_role(env: &Env, owner: &Address, role: Role, holder: &Address) -> Result<(), Error> {
        Self::require_owner(env, owner)?;
        get_phase(env)?.require_active()?;
        set_role(env, role, holder);
        env.events().publish((ROLE_CHANGED, role), holder.clone());
        Ok(())
    }

    /// Settle and store one account, returning the updated record
    fn settle(env: &Env, identity: &Address) -> Result<Account, Error> {
        let mut account = get_account(env, identity);
        let accrued = profit::settle(
            &mut account,
            get_total_profits(env),
            get_total_supply(env),
        )?;
        set_account(env, identity, &account);

        if accrued > 0 {
            env.events()
                .publish((PROFIT_SETTLED,), (identity.clone(), accrued));
        }
        Ok(account)
    }

    /// Both sides settle on their pre-transfer balances before anything moves
    fn move_balance(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
        Self::settle(env, from)?;
        Self::settle(env, to)?;

        let mut sender = get_account(env, from);
        if sender.balance < amount {
            return Err(Error::InsufficientBalance);
        }
        sender.balance = math::sub(sender.balance, amount)?;
        set_account(env, from, &sender);

        let mut receiver = get_account(env, to);
        receiver.balance = math::add(receiver.balance, amount)?;
        set_account(env, to, &receiver);
        Ok(())
    }

    fn pay_out(env: &Env, identity: &Address, beneficiary: &Address) -> Result<i128, Error> {
        get_phase(env)?.require_fixed_supply()?;

        let mut account = Self::settle(env, identity)?;
        let amount = account.settled_share;
        account.settled_share = 0;
        set_account(env, identity, &account);

        if amount > 0 {
            TokenClient::new(env, &get_payment_token(env)?).transfer(
                &env.current_contract_address(),
                beneficiary,
                &amount,
            );
        }

        env.events().publish(
            (PROFIT_WITHDRAWN,),
            (identity.clone(), beneficiary.clone(), amount),
        );
        Ok(amount)
    }
}
