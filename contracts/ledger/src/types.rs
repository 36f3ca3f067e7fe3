use shared::errors::Error;
use soroban_sdk::{contracttype, Address, String};

/// Per-identity ledger record. Moved as a whole on key recovery.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
    pub balance: i128,
    /// `total_profits_deposited` at the last settlement
    pub last_profit_checkpoint: i128,
    /// Profit owed and not yet withdrawn
    pub settled_share: i128,
}

impl Account {
    /// An unused record can receive a recovered key.
    pub fn is_unused(&self) -> bool {
        self.balance == 0 && self.last_profit_checkpoint == 0 && self.settled_share == 0
    }
}

/// Ledger lifecycle. Transitions only move forward; nothing yields `Minting`.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LedgerPhase {
    /// Supply is still growing, transfers and profit accounting are off
    Minting = 0,
    /// Supply is final, transfers and profit accounting are on
    FixedSupply = 1,
    /// Sale missed its goal; the ledger is permanently inert
    Disabled = 2,
}

impl LedgerPhase {
    pub fn finish_minting(self) -> Result<LedgerPhase, Error> {
        match self {
            LedgerPhase::Minting => Ok(LedgerPhase::FixedSupply),
            LedgerPhase::FixedSupply => Err(Error::MintingFinished),
            LedgerPhase::Disabled => Err(Error::LedgerDisabled),
        }
    }

    pub fn disable(self) -> Result<LedgerPhase, Error> {
        match self {
            LedgerPhase::Minting => Ok(LedgerPhase::Disabled),
            LedgerPhase::FixedSupply => Err(Error::MintingFinished),
            LedgerPhase::Disabled => Err(Error::LedgerDisabled),
        }
    }

    pub fn require_minting(self) -> Result<(), Error> {
        match self {
            LedgerPhase::Minting => Ok(()),
            LedgerPhase::FixedSupply => Err(Error::MintingFinished),
            LedgerPhase::Disabled => Err(Error::LedgerDisabled),
        }
    }

    pub fn require_fixed_supply(self) -> Result<(), Error> {
        match self {
            LedgerPhase::Minting => Err(Error::MintingNotFinished),
            LedgerPhase::FixedSupply => Ok(()),
            LedgerPhase::Disabled => Err(Error::LedgerDisabled),
        }
    }

    pub fn require_active(self) -> Result<(), Error> {
        if self == LedgerPhase::Disabled {
            return Err(Error::LedgerDisabled);
        }
        Ok(())
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

/// Deployment parameters for the ledger
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerConfig {
    pub owner: Address,
    /// Access registry consulted on every gated call
    pub registry: Address,
    /// Token profits are deposited and paid out in
    pub payment_token: Address,
    pub profit_depositor: Address,
    pub profit_distributor: Address,
    pub recovery_agent: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Which role a role-maintenance call replaced
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    ProfitDepositor = 0,
    ProfitDistributor = 1,
    RecoveryAgent = 2,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Owner,
    Registry,
    PaymentToken,
    Minter,
    Phase,
    TotalSupply,
    TotalProfits,
    Role(Role),
    Account(Address),
    Allowance(Address, Address),
}
