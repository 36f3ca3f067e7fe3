//! Cross-contract interfaces. Consumers call through the generated clients so
//! they never link against the implementing crate.

use crate::errors::Error;
use soroban_sdk::{contractclient, Address, Env};

/// Allow-list consulted by the ledger and the sale on every gated call.
#[contractclient(name = "AccessRegistryClient")]
pub trait AccessRegistryInterface {
    fn is_member(env: Env, identity: Address) -> bool;
}

/// The minter-facing surface of the ledger.
#[contractclient(name = "LedgerClient")]
pub trait LedgerInterface {
    fn minter(env: Env) -> Option<Address>;

    fn mint(env: Env, minter: Address, to: Address, amount: i128) -> Result<(), Error>;

    fn finish_minting(env: Env, minter: Address) -> Result<(), Error>;

    fn disable(env: Env, minter: Address) -> Result<(), Error>;
}
