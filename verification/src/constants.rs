//! Consensus constants that are not chain parameters.

/// Money supply cap, in satoshis.
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Lower bound of the coinbase signature script length.
pub const MIN_COINBASE_SIZE: usize = 2;

/// Upper bound of the coinbase signature script length.
pub const MAX_COINBASE_SIZE: usize = 100;
