use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidInput = 4,
    NotMember = 5,

    // Ledger errors
    AlreadySet = 10,
    MintingFinished = 11,
    MintingNotFinished = 12,
    LedgerDisabled = 13,
    InsufficientBalance = 14,
    InsufficientAllowance = 15,
    AddressInUse = 16,
    MinterNotSet = 17,

    // Sale errors
    SaleNotOpen = 20,
    SaleNotClosed = 21,
    AlreadyFinalized = 22,
    NotFinalized = 23,
    GoalWasReached = 24,
    CapExceeded = 25,
    RateChangeTooLarge = 26,
    LengthMismatch = 27,
    InvalidSchedule = 28,
    GoalUnattainable = 29,
    TokenAlreadyBound = 30,
    BatchTooLarge = 31,

    // Arithmetic errors
    Overflow = 40,
    Underflow = 41,
    DivisionByZero = 42,
}

/// Cause-based grouping of [`Error`] variants.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Caller lacks the required role.
    Authorization,
    /// Operation invalid for the current phase.
    State,
    /// Bad argument: zero, mismatched lengths, bounds, caps.
    Validation,
    /// Overflow, underflow or division by zero.
    Arithmetic,
}

impl Error {
    /// Stable reason string. Tooling matches these verbatim, do not reword.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::NotInitialized => "contract not initialized",
            Error::AlreadyInitialized => "contract already initialized",
            Error::Unauthorized => "caller lacks the required role",
            Error::InvalidInput => "invalid argument",
            Error::NotMember => "identity is not on the allow-list",
            Error::AlreadySet => "minter already set",
            Error::MintingFinished => "minting has finished",
            Error::MintingNotFinished => "minting has not finished",
            Error::LedgerDisabled => "ledger is disabled",
            Error::InsufficientBalance => "insufficient balance",
            Error::InsufficientAllowance => "insufficient allowance",
            Error::AddressInUse => "address in use",
            Error::MinterNotSet => "minter not set",
            Error::SaleNotOpen => "sale is not open",
            Error::SaleNotClosed => "sale is not closed",
            Error::AlreadyFinalized => "sale already finalized",
            Error::NotFinalized => "sale not finalized",
            Error::GoalWasReached => "goal was reached",
            Error::CapExceeded => "cap exceeded",
            Error::RateChangeTooLarge => "rate change too large",
            Error::LengthMismatch => "array lengths differ",
            Error::InvalidSchedule => "invalid sale schedule",
            Error::GoalUnattainable => "goal exceeds total cap",
            Error::TokenAlreadyBound => "token already bound to a minter",
            Error::BatchTooLarge => "batch too large",
            Error::Overflow => "arithmetic overflow",
            Error::Underflow => "arithmetic underflow",
            Error::DivisionByZero => "division by zero",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthorized => ErrorKind::Authorization,

            Error::NotInitialized
            | Error::AlreadyInitialized
            | Error::AlreadySet
            | Error::MintingFinished
            | Error::MintingNotFinished
            | Error::LedgerDisabled
            | Error::MinterNotSet
            | Error::SaleNotOpen
            | Error::SaleNotClosed
            | Error::AlreadyFinalized
            | Error::NotFinalized
            | Error::GoalWasReached
            | Error::TokenAlreadyBound => ErrorKind::State,

            Error::InvalidInput
            | Error::NotMember
            | Error::InsufficientBalance
            | Error::InsufficientAllowance
            | Error::AddressInUse
            | Error::CapExceeded
            | Error::RateChangeTooLarge
            | Error::LengthMismatch
            | Error::InvalidSchedule
            | Error::GoalUnattainable
            | Error::BatchTooLarge => ErrorKind::Validation,

            Error::Overflow | Error::Underflow | Error::DivisionByZero => ErrorKind::Arithmetic,
        }
    }
}
