use soroban_sdk::{contracttype, Address};

/// Deployment parameters, fixed after `initialize`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleConfig {
    pub owner: Address,
    /// Ledger this sale mints into; the sale must be its minter
    pub ledger: Address,
    pub registry: Address,
    /// Token buyers pay with
    pub payment_token: Address,
    /// Initial rate admin
    pub rate_admin: Address,
    pub treasury: Address,
    pub reserve_account: Address,
    /// Tokens minted to `reserve_account` when the goal is met
    pub reserve_amount: i128,
    pub opening_time: u64,
    pub closing_time: u64,
    pub token_price: i128,
    /// Initial exchange rate
    pub exchange_rate: i128,
    pub cap_public: i128,
    pub cap_private: i128,
    /// Minimum tokens sold across both pools for the raise to succeed
    pub goal: i128,
}

/// Mutable sale state
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleState {
    pub rate_admin: Address,
    pub exchange_rate: i128,
    pub sold_public: i128,
    pub sold_private: i128,
    /// Sum of all `investments` still held by the sale
    pub total_escrowed: i128,
    pub outcome: Option<SaleOutcome>,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaleOutcome {
    GoalMet,
    GoalMissed,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SalePhase {
    /// Before `opening_time`
    Pending,
    /// `opening_time <= now < closing_time`
    Open,
    /// Past `closing_time`, awaiting finalization
    Closed,
    Finalized(SaleOutcome),
}

impl SalePhase {
    pub fn at(config: &SaleConfig, state: &SaleState, now: u64) -> SalePhase {
        if let Some(outcome) = state.outcome {
            SalePhase::Finalized(outcome)
        } else if now < config.opening_time {
            SalePhase::Pending
        } else if now < config.closing_time {
            SalePhase::Open
        } else {
            SalePhase::Closed
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Pool {
    Public = 0,
    Private = 1,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    State,
    /// Escrowed payment per buyer
    Investment(Address),
}
