//! Lazy proportional profit accounting.
//!
//! A deposit only bumps the global `total_profits_deposited` counter. Each
//! account's share of everything deposited since its checkpoint is computed on
//! demand and persisted on settlement, so no operation touches more than the
//! accounts it names.

use crate::types::Account;
use shared::errors::Error;
use shared::math;

/// `settled_share + floor(balance * (total_profits - checkpoint) / total_supply)`
pub fn owing(account: &Account, total_profits: i128, total_supply: i128) -> Result<i128, Error> {
    if total_supply == 0 {
        return Ok(account.settled_share);
    }
    let unaccounted = math::sub(total_profits, account.last_profit_checkpoint)?;
    let accrued = math::mul_div(account.balance, unaccounted, total_supply)?;
    math::add(account.settled_share, accrued)
}

/// Persists the owing amount into the record and advances its checkpoint.
/// Returns the amount newly moved into `settled_share`.
pub fn settle(account: &mut Account, total_profits: i128, total_supply: i128) -> Result<i128, Error> {
    let owed = owing(account, total_profits, total_supply)?;
    let accrued = math::sub(owed, account.settled_share)?;
    account.settled_share = owed;
    account.last_profit_checkpoint = total_profits;
    Ok(accrued)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: i128) -> Account {
        Account {
            balance,
            ..Account::default()
        }
    }

    #[test]
    fn test_owing_is_proportional() {
        let unit = 10_000_000;
        assert_eq!(owing(&account(4000), unit, 8000), Ok(5_000_000));
        assert_eq!(owing(&account(3000), unit, 8000), Ok(3_750_000));
        assert_eq!(owing(&account(1000), unit, 8000), Ok(1_250_000));
    }

    #[test]
    fn test_owing_without_supply_keeps_settled() {
        let mut a = account(0);
        a.settled_share = 42;
        assert_eq!(owing(&a, 1_000, 0), Ok(42));
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut a = account(1000);
        assert_eq!(settle(&mut a, 800, 8000), Ok(100));
        let snapshot = a.clone();
        assert_eq!(settle(&mut a, 800, 8000), Ok(0));
        assert_eq!(a, snapshot);
        assert_eq!(a.last_profit_checkpoint, 800);
    }

    #[test]
    fn test_dust_is_left_unattributed() {
        let mut a = account(1);
        assert_eq!(settle(&mut a, 2, 3), Ok(0));
        // The checkpoint still moves; the fraction is not carried forward.
        assert_eq!(a.last_profit_checkpoint, 2);
    }
}
