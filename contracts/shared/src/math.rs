//! Checked `i128` helpers that map failures onto the shared error taxonomy.

use crate::errors::Error;

pub fn add(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_add(b).ok_or(Error::Overflow)
}

/// Amounts are unsigned in meaning, so a negative result is an underflow.
pub fn sub(a: i128, b: i128) -> Result<i128, Error> {
    match a.checked_sub(b) {
        Some(v) if v >= 0 => Ok(v),
        _ => Err(Error::Underflow),
    }
}

/// `floor(a * b / c)` for non-negative operands.
pub fn mul_div(a: i128, b: i128, c: i128) -> Result<i128, Error> {
    if c == 0 {
        return Err(Error::DivisionByZero);
    }
    a.checked_mul(b)
        .ok_or(Error::Overflow)?
        .checked_div(c)
        .ok_or(Error::Overflow)
}

/// Rejects negative amounts coming in from callers.
pub fn require_non_negative(amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidInput);
    }
    Ok(())
}
