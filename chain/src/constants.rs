/// Setting nSequence to this value for every input in a transaction disables nLockTime.
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Threshold for `lock_time`: below this value it is interpreted as block number,
/// otherwise as UNIX timestamp.
pub const LOCKTIME_THRESHOLD: u32 = 500000000; // Tue Nov  5 00:53:20 1985 UTC
