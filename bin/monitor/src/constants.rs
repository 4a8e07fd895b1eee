/// The default interval between two polls of the L1 head, in milliseconds.
pub(crate) const L1_POLL_INTERVAL_MS: u64 = 12_000;

/// The default number of retries of a chain read.
pub(crate) const RPC_MAX_RETRIES: usize = 4;

/// The default delay between two attempts of a chain read, in milliseconds.
pub(crate) const RPC_RETRY_DELAY_MS: u64 = 500;

/// The maximum number of missed L1 blocks processed when the head jumps.
pub(crate) const MAX_L1_CATCH_UP: u64 = 32;
