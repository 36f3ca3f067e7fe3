/// A single rate adjustment may move the rate by at most this factor.
pub const RATE_CHANGE_FACTOR: i128 = 10;

/// Upper bound on the number of entries any batch entry point accepts.
pub const MAX_BATCH_SIZE: u32 = 100;

/// Default token decimals, matches Stellar asset precision.
pub const DEFAULT_DECIMALS: u32 = 7;
