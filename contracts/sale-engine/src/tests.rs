#![cfg(test)]

use crate::{SaleConfig, SaleEngineContract, SaleEngineContractClient, SaleOutcome, SalePhase};
use access_registry::{AccessRegistry, AccessRegistryClient};
use ledger::{LedgerConfig, LedgerContract, LedgerContractClient, LedgerPhase};
use shared::{
    errors::Error,
    events::{FINALIZED, PURCHASED, RATE_ADMIN_CHANGED, RATE_CHANGED, REFUNDED, TOKEN_DISTRIBUTED},
    DEFAULT_DECIMALS, MAX_BATCH_SIZE,
};
use soroban_sdk::{
    testutils::{Address as _, Events, Ledger},
    token::{StellarAssetClient, TokenClient},
    vec, Address, Env, String, Symbol, TryFromVal, Val, Vec,
};

const NOW: u64 = 1_000;
const OPENING: u64 = 2_000;
const CLOSING: u64 = 3_000;

struct Setup {
    env: Env,
    owner: Address,
    rate_admin: Address,
    treasury: Address,
    reserve: Address,
    registry_admin: Address,
    registry: AccessRegistryClient<'static>,
    ledger: LedgerContractClient<'static>,
    payment: TokenClient<'static>,
    payment_admin: StellarAssetClient<'static>,
    sale: SaleEngineContractClient<'static>,
}

impl Setup {
    /// Registry, payment token and ledger wired to a fresh, uninitialized sale
    fn deploy() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_timestamp(NOW);

        let owner = Address::generate(&env);
        let registry_admin = Address::generate(&env);

        let registry =
            AccessRegistryClient::new(&env, &env.register_contract(None, AccessRegistry));
        registry.initialize(&registry_admin);

        let asset = env.register_stellar_asset_contract_v2(Address::generate(&env));
        let payment = TokenClient::new(&env, &asset.address());
        let payment_admin = StellarAssetClient::new(&env, &asset.address());

        let ledger = LedgerContractClient::new(&env, &env.register_contract(None, LedgerContract));
        ledger.initialize(&LedgerConfig {
            owner: owner.clone(),
            registry: registry.address.clone(),
            payment_token: asset.address(),
            profit_depositor: owner.clone(),
            profit_distributor: owner.clone(),
            recovery_agent: owner.clone(),
            name: String::from_str(&env, "Project Share"),
            symbol: String::from_str(&env, "PSH"),
            decimals: DEFAULT_DECIMALS,
        });

        let sale =
            SaleEngineContractClient::new(&env, &env.register_contract(None, SaleEngineContract));
        ledger.set_minter(&owner, &sale.address);

        let reserve = Address::generate(&env);
        registry.add_member(&registry_admin, &reserve);

        Setup {
            rate_admin: Address::generate(&env),
            treasury: Address::generate(&env),
            reserve,
            env,
            owner,
            registry_admin,
            registry,
            ledger,
            payment,
            payment_admin,
            sale,
        }
    }

    fn config(&self) -> SaleConfig {
        SaleConfig {
            owner: self.owner.clone(),
            ledger: self.ledger.address.clone(),
            registry: self.registry.address.clone(),
            payment_token: self.payment.address.clone(),
            rate_admin: self.rate_admin.clone(),
            treasury: self.treasury.clone(),
            reserve_account: self.reserve.clone(),
            reserve_amount: 10,
            opening_time: OPENING,
            closing_time: CLOSING,
            token_price: 1,
            exchange_rate: 2,
            cap_public: 100,
            cap_private: 50,
            goal: 20,
        }
    }

    fn new() -> Self {
        let s = Self::deploy();
        s.sale.initialize(&s.config());
        s
    }

    /// Allow-listed identity holding `funds` of the payment token
    fn investor(&self, funds: i128) -> Address {
        let id = Address::generate(&self.env);
        self.registry.add_member(&self.registry_admin, &id);
        if funds > 0 {
            self.payment_admin.mint(&id, &funds);
        }
        id
    }

    fn warp(&self, timestamp: u64) {
        self.env.ledger().set_timestamp(timestamp);
    }

    /// Number of published events whose first topic is `topic` and whose
    /// data decodes to `data`
    fn published<D>(&self, topic: Symbol, data: &D) -> usize
    where
        D: TryFromVal<Env, Val> + PartialEq,
    {
        self.events_under(topic)
            .iter()
            .filter(|value| {
                D::try_from_val(&self.env, value)
                    .map(|d| d == *data)
                    .unwrap_or(false)
            })
            .count()
    }

    fn events_under(&self, topic: Symbol) -> Vec<Val> {
        let mut found = Vec::new(&self.env);
        for (_, topics, value) in self.env.events().all().iter() {
            let first = topics
                .get(0)
                .and_then(|t| Symbol::try_from_val(&self.env, &t).ok());
            if first == Some(topic.clone()) {
                found.push_back(value);
            }
        }
        found
    }
}

// ==================== Initialization ====================

#[test]
fn test_initialize() {
    let s = Setup::new();
    assert_eq!(s.sale.config(), s.config());
    assert_eq!(s.sale.phase(), SalePhase::Pending);
    assert_eq!(s.sale.rate(), 2);
    assert_eq!(s.sale.rate_admin(), s.rate_admin);
    assert_eq!(s.sale.remaining_public(), 100);
    assert_eq!(s.sale.remaining_private(), 50);
    assert_eq!(s.sale.time_remaining(), CLOSING - NOW);
    assert!(!s.sale.is_finalized());
    assert!(!s.sale.goal_reached());
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn test_initialize_twice() {
    let s = Setup::new();
    s.sale.initialize(&s.config());
}

#[test]
fn test_initialize_rejects_bad_config() {
    let s = Setup::deploy();

    let mut config = s.config();
    config.cap_public = 0;
    assert_eq!(s.sale.try_initialize(&config), Err(Ok(Error::InvalidInput)));

    let mut config = s.config();
    config.exchange_rate = 0;
    assert_eq!(s.sale.try_initialize(&config), Err(Ok(Error::InvalidInput)));

    let mut config = s.config();
    config.token_price = 0;
    assert_eq!(s.sale.try_initialize(&config), Err(Ok(Error::InvalidInput)));

    let mut config = s.config();
    config.goal = 151;
    assert_eq!(
        s.sale.try_initialize(&config),
        Err(Ok(Error::GoalUnattainable))
    );

    let mut config = s.config();
    config.cap_private = i128::MAX;
    assert_eq!(s.sale.try_initialize(&config), Err(Ok(Error::Overflow)));

    let mut config = s.config();
    config.opening_time = NOW;
    assert_eq!(
        s.sale.try_initialize(&config),
        Err(Ok(Error::InvalidSchedule))
    );

    let mut config = s.config();
    config.closing_time = OPENING;
    assert_eq!(
        s.sale.try_initialize(&config),
        Err(Ok(Error::InvalidSchedule))
    );

    let mut config = s.config();
    config.reserve_account = Address::generate(&s.env);
    assert_eq!(s.sale.try_initialize(&config), Err(Ok(Error::NotMember)));

    // A valid config still goes through afterwards
    s.sale.initialize(&s.config());
}

#[test]
fn test_initialize_rejects_bound_token() {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(NOW);

    let owner = Address::generate(&env);
    let ledger = LedgerContractClient::new(&env, &env.register_contract(None, LedgerContract));
    ledger.initialize(&LedgerConfig {
        owner: owner.clone(),
        registry: Address::generate(&env),
        payment_token: Address::generate(&env),
        profit_depositor: owner.clone(),
        profit_distributor: owner.clone(),
        recovery_agent: owner.clone(),
        name: String::from_str(&env, "Project Share"),
        symbol: String::from_str(&env, "PSH"),
        decimals: DEFAULT_DECIMALS,
    });
    ledger.set_minter(&owner, &Address::generate(&env));

    let sale =
        SaleEngineContractClient::new(&env, &env.register_contract(None, SaleEngineContract));
    let result = sale.try_initialize(&SaleConfig {
        owner: owner.clone(),
        ledger: ledger.address.clone(),
        registry: Address::generate(&env),
        payment_token: Address::generate(&env),
        rate_admin: owner.clone(),
        treasury: owner.clone(),
        reserve_account: owner.clone(),
        reserve_amount: 0,
        opening_time: OPENING,
        closing_time: CLOSING,
        token_price: 1,
        exchange_rate: 1,
        cap_public: 10,
        cap_private: 10,
        goal: 5,
    });
    assert_eq!(result, Err(Ok(Error::TokenAlreadyBound)));
}

// ==================== Phases ====================

#[test]
fn test_phase_follows_clock() {
    let s = Setup::new();
    assert_eq!(s.sale.phase(), SalePhase::Pending);
    s.warp(OPENING);
    assert_eq!(s.sale.phase(), SalePhase::Open);
    assert_eq!(s.sale.time_remaining(), CLOSING - OPENING);
    s.warp(CLOSING - 1);
    assert_eq!(s.sale.phase(), SalePhase::Open);
    s.warp(CLOSING);
    assert_eq!(s.sale.phase(), SalePhase::Closed);
    assert_eq!(s.sale.time_remaining(), 0);
}

// ==================== Rate management ====================

#[test]
fn test_rate_change_bounds() {
    let s = Setup::new();

    assert_eq!(
        s.sale.try_set_rate(&s.rate_admin, &22),
        Err(Ok(Error::RateChangeTooLarge))
    );
    assert_eq!(s.sale.rate(), 2);

    s.sale.set_rate(&s.rate_admin, &20);
    assert_eq!(s.sale.rate(), 20);
    s.sale.set_rate(&s.rate_admin, &2);
    assert_eq!(s.sale.rate(), 2);

    assert_eq!(
        s.sale.try_set_rate(&s.rate_admin, &0),
        Err(Ok(Error::RateChangeTooLarge))
    );
    s.sale.set_rate(&s.rate_admin, &20);
    assert_eq!(
        s.sale.try_set_rate(&s.rate_admin, &1),
        Err(Ok(Error::RateChangeTooLarge))
    );
    assert_eq!(s.sale.rate(), 20);
}

#[test]
fn test_rate_requires_rate_admin() {
    let s = Setup::new();
    assert_eq!(
        s.sale.try_set_rate(&s.owner, &3),
        Err(Ok(Error::Unauthorized))
    );

    let new_admin = Address::generate(&s.env);
    assert_eq!(
        s.sale.try_set_rate_admin(&s.rate_admin, &new_admin),
        Err(Ok(Error::Unauthorized))
    );
    s.sale.set_rate_admin(&s.owner, &new_admin);
    s.sale.set_rate_admin(&s.owner, &new_admin);
    assert_eq!(s.sale.rate_admin(), new_admin);
    assert_eq!(s.events_under(RATE_ADMIN_CHANGED).len(), 1);
    assert_eq!(
        s.published(RATE_ADMIN_CHANGED, &(s.rate_admin.clone(), new_admin.clone())),
        1
    );

    assert_eq!(
        s.sale.try_set_rate(&s.rate_admin, &3),
        Err(Ok(Error::Unauthorized))
    );
    s.sale.set_rate(&new_admin, &3);
    assert_eq!(s.sale.rate(), 3);
}

// ==================== Purchase ====================

#[test]
fn test_purchase_only_while_open() {
    let s = Setup::new();
    let buyer = s.investor(100);

    assert_eq!(s.sale.try_purchase(&buyer, &5), Err(Ok(Error::SaleNotOpen)));
    s.warp(CLOSING);
    assert_eq!(s.sale.try_purchase(&buyer, &5), Err(Ok(Error::SaleNotOpen)));
    assert_eq!(s.payment.balance(&buyer), 100);
}

#[test]
fn test_purchase_requires_membership_and_value() {
    let s = Setup::new();
    s.warp(OPENING);

    let outsider = Address::generate(&s.env);
    s.payment_admin.mint(&outsider, &100);
    assert_eq!(s.sale.try_purchase(&outsider, &5), Err(Ok(Error::NotMember)));

    let buyer = s.investor(100);
    assert_eq!(s.sale.try_purchase(&buyer, &0), Err(Ok(Error::InvalidInput)));
    assert_eq!(s.sale.try_purchase(&buyer, &-3), Err(Ok(Error::InvalidInput)));
}

#[test]
fn test_purchase_escrows_until_goal_then_forwards() {
    let s = Setup::new();
    s.warp(OPENING);
    let buyer = s.investor(100);

    // 11 units at rate 2 / price 1 reach the goal of 20 tokens
    assert_eq!(s.sale.purchase(&buyer, &11), 22);
    assert_eq!(s.ledger.balance(&buyer), 22);
    assert_eq!(s.sale.investment(&buyer), 11);
    assert_eq!(s.sale.total_escrowed(), 11);
    assert_eq!(s.payment.balance(&s.sale.address), 11);
    assert!(s.sale.goal_reached());

    assert_eq!(s.sale.purchase(&buyer, &1), 2);
    assert_eq!(s.payment.balance(&s.treasury), 1);
    assert_eq!(s.sale.investment(&buyer), 11);
    assert_eq!(s.payment.balance(&s.sale.address), 11);
    assert_eq!(s.ledger.balance(&buyer), 24);
    assert_eq!(s.sale.remaining_public(), 76);
}

#[test]
fn test_goal_crossing_purchase_is_escrowed() {
    let s = Setup::new();
    s.warp(OPENING);
    let first = s.investor(100);
    let second = s.investor(100);

    s.sale.purchase(&first, &9);
    // 18 sold; this one crosses the goal of 20
    s.sale.purchase(&second, &5);

    assert_eq!(s.sale.investment(&second), 5);
    assert_eq!(s.payment.balance(&s.treasury), 0);
    assert_eq!(s.sale.total_escrowed(), 14);
}

#[test]
fn test_purchase_cap_exceeded() {
    let s = Setup::new();
    s.warp(OPENING);
    let buyer = s.investor(1_000);

    s.sale.purchase(&buyer, &50);
    assert_eq!(s.sale.remaining_public(), 0);
    assert_eq!(s.sale.try_purchase(&buyer, &1), Err(Ok(Error::CapExceeded)));
    assert_eq!(s.ledger.total_supply(), 100);
}

#[test]
fn test_purchase_uses_current_rate() {
    let s = Setup::new();
    s.warp(OPENING);
    let buyer = s.investor(100);

    s.sale.set_rate(&s.rate_admin, &5);
    assert_eq!(s.published(RATE_CHANGED, &(2i128, 5i128)), 1);
    assert_eq!(s.sale.purchase(&buyer, &3), 15);
    assert_eq!(s.published(PURCHASED, &(buyer.clone(), 3i128, 15i128)), 1);
}

// ==================== Distribution ====================

#[test]
fn test_distribute_via_pools() {
    let s = Setup::new();
    let a = s.investor(0);
    let b = s.investor(0);

    s.sale.distribute_via_private_sale(
        &s.owner,
        &vec![&s.env, a.clone(), b.clone()],
        &vec![&s.env, 30, 20],
    );
    s.sale
        .distribute_via_public_sale(&s.owner, &vec![&s.env, a.clone()], &vec![&s.env, 5]);

    assert_eq!(s.ledger.balance(&a), 35);
    assert_eq!(s.ledger.balance(&b), 20);
    assert_eq!(s.sale.remaining_private(), 0);
    assert_eq!(s.sale.remaining_public(), 95);
    assert_eq!(s.published(TOKEN_DISTRIBUTED, &(a.clone(), 30i128)), 1);
    assert_eq!(s.published(TOKEN_DISTRIBUTED, &(b.clone(), 20i128)), 1);
    assert_eq!(s.events_under(TOKEN_DISTRIBUTED).len(), 3);
    assert_eq!(s.sale.state().sold_private, 50);

    assert_eq!(
        s.sale
            .try_distribute_via_private_sale(&s.owner, &vec![&s.env, a.clone()], &vec![&s.env, 1]),
        Err(Ok(Error::CapExceeded))
    );
}

#[test]
fn test_distribute_validation() {
    let s = Setup::new();
    let a = s.investor(0);

    assert_eq!(
        s.sale.try_distribute_via_public_sale(
            &s.owner,
            &vec![&s.env, a.clone()],
            &Vec::<i128>::new(&s.env)
        ),
        Err(Ok(Error::LengthMismatch))
    );
    assert_eq!(
        s.sale
            .try_distribute_via_public_sale(&s.rate_admin, &vec![&s.env, a.clone()], &vec![&s.env, 1]),
        Err(Ok(Error::Unauthorized))
    );

    let outsider = Address::generate(&s.env);
    let result = s.sale.try_distribute_via_public_sale(
        &s.owner,
        &vec![&s.env, outsider],
        &vec![&s.env, 1],
    );
    assert!(result.is_err());
    assert_eq!(s.sale.remaining_public(), 100);
}

// ==================== Finalization ====================

#[test]
fn test_finalize_requires_closed_sale() {
    let s = Setup::new();
    assert_eq!(s.sale.try_finalize(&s.owner), Err(Ok(Error::SaleNotClosed)));
    s.warp(OPENING);
    assert_eq!(s.sale.try_finalize(&s.owner), Err(Ok(Error::SaleNotClosed)));
    s.warp(CLOSING);
    assert_eq!(
        s.sale.try_finalize(&s.rate_admin),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_finalize_goal_met() {
    let s = Setup::new();
    s.warp(OPENING);
    let buyer = s.investor(100);
    s.sale.purchase(&buyer, &11);
    s.sale.purchase(&buyer, &4);

    s.warp(CLOSING);
    assert_eq!(s.sale.finalize(&s.owner), SaleOutcome::GoalMet);
    assert_eq!(s.published(FINALIZED, &true), 1);

    assert_eq!(s.sale.phase(), SalePhase::Finalized(SaleOutcome::GoalMet));
    assert_eq!(s.ledger.phase(), LedgerPhase::FixedSupply);
    assert_eq!(s.ledger.balance(&s.reserve), 10);
    assert_eq!(s.ledger.total_supply(), 40);
    assert_eq!(s.payment.balance(&s.treasury), 15);
    assert_eq!(s.payment.balance(&s.sale.address), 0);
    assert_eq!(s.sale.total_escrowed(), 0);
    assert_eq!(s.sale.investment(&buyer), 0);

    assert_eq!(s.sale.try_finalize(&s.owner), Err(Ok(Error::AlreadyFinalized)));
    assert_eq!(
        s.sale.try_claim_refund(&buyer),
        Err(Ok(Error::GoalWasReached))
    );
    assert_eq!(
        s.sale
            .try_distribute_via_public_sale(&s.owner, &vec![&s.env, buyer.clone()], &vec![&s.env, 1]),
        Err(Ok(Error::AlreadyFinalized))
    );

    // Tokens are now transferable
    let other = s.investor(0);
    s.ledger.transfer(&buyer, &other, &4);
    assert_eq!(s.ledger.balance(&other), 4);
}

#[test]
fn test_finalize_goal_missed_and_refund() {
    let s = Setup::new();
    s.warp(OPENING);
    let buyer = s.investor(100);
    s.sale.purchase(&buyer, &5);
    s.sale.purchase(&buyer, &3);
    assert_eq!(s.payment.balance(&buyer), 92);

    assert_eq!(s.sale.try_claim_refund(&buyer), Err(Ok(Error::NotFinalized)));

    s.warp(CLOSING + 1);
    assert_eq!(s.sale.finalize(&s.owner), SaleOutcome::GoalMissed);
    assert_eq!(s.published(FINALIZED, &false), 1);
    assert_eq!(s.ledger.phase(), LedgerPhase::Disabled);
    assert_eq!(s.ledger.balance(&s.reserve), 0);

    assert_eq!(s.sale.claim_refund(&buyer), 8);
    assert_eq!(s.published(REFUNDED, &(buyer.clone(), 8i128)), 1);
    assert_eq!(s.payment.balance(&buyer), 100);
    assert_eq!(s.sale.investment(&buyer), 0);

    assert_eq!(s.sale.claim_refund(&buyer), 0);
    assert_eq!(s.payment.balance(&buyer), 100);
    assert_eq!(s.sale.total_escrowed(), 0);

    assert_eq!(
        s.ledger.try_transfer(&buyer, &s.reserve, &1),
        Err(Ok(Error::LedgerDisabled))
    );
}

#[test]
fn test_distribute_refunds() {
    let s = Setup::new();
    s.warp(OPENING);
    let a = s.investor(10);
    let b = s.investor(10);
    let idle = s.investor(10);
    s.sale.purchase(&a, &4);
    s.sale.purchase(&b, &5);

    let batch = vec![&s.env, a.clone(), b.clone(), idle.clone()];
    assert_eq!(
        s.sale.try_distribute_refunds(&s.owner, &batch),
        Err(Ok(Error::NotFinalized))
    );

    s.warp(CLOSING);
    s.sale.finalize(&s.owner);

    assert_eq!(
        s.sale.try_distribute_refunds(&s.rate_admin, &batch),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(s.sale.distribute_refunds(&s.owner, &batch), 9);
    assert_eq!(s.payment.balance(&a), 10);
    assert_eq!(s.payment.balance(&b), 10);
    assert_eq!(s.payment.balance(&idle), 10);
    assert_eq!(s.payment.balance(&s.sale.address), 0);
}

#[test]
fn test_batches_are_bounded() {
    let s = Setup::new();
    let a = s.investor(0);

    let mut beneficiaries = Vec::new(&s.env);
    let mut amounts = Vec::new(&s.env);
    for _ in 0..=MAX_BATCH_SIZE {
        beneficiaries.push_back(a.clone());
        amounts.push_back(0i128);
    }

    assert_eq!(
        s.sale
            .try_distribute_via_public_sale(&s.owner, &beneficiaries, &amounts),
        Err(Ok(Error::BatchTooLarge))
    );
    assert_eq!(
        s.sale
            .try_distribute_via_private_sale(&s.owner, &beneficiaries, &amounts),
        Err(Ok(Error::BatchTooLarge))
    );
    assert_eq!(
        s.sale.try_distribute_refunds(&s.owner, &beneficiaries),
        Err(Ok(Error::BatchTooLarge))
    );
}
