//! Default values of the monitor configuration.

use std::{num::NonZeroUsize, time::Duration};

/// The number of seconds before the L1 block timestamp an L2 block stays in scope. Matches the
/// maximum L2 finality lag.
pub const WINDOW_LOOKBACK_SECS: u64 = 768;

/// The number of seconds after the L1 block timestamp an L2 block is in scope, covering the
/// forward clock skew between the chains.
pub const WINDOW_LOOKAHEAD_SECS: u64 = 60;

/// The maximum number of L2 blocks collected by a single backward walk.
pub const WINDOW_MAX_WALK: usize = 8_192;

/// The number of blocks a search bracket is extended by when it misses the target.
pub const SYNC_EXTENSION_OFFSET: u64 = 20;

/// The maximum number of block fetches a single search may issue.
pub const SYNC_MAX_STEPS: usize = 1_024;

/// The rolling window of the withdrawal volume.
pub const WITHDRAWAL_WINDOW: Duration = Duration::from_secs(48 * 60 * 60);

/// The withdrawal volume threshold, in whole tokens.
pub const WITHDRAWAL_THRESHOLD_TOKENS: u64 = 10_000;

/// Volume alerts are only raised at L2 block numbers multiple of this value.
pub const WITHDRAWAL_ALERT_MODULUS: u64 = 10;

/// The L2 block time assumed when a timestamp cannot be read.
pub const L2_BLOCK_TIME_SECS: u64 = 2;

/// Proxies are polled at L2 block numbers multiple of this value.
pub const PROXY_POLL_INTERVAL: u64 = 25;

/// The number of network errors that trips the health checker.
pub const HEALTH_ERROR_CEILING: usize = 5_000;

/// The time border of the health checker error window.
pub const HEALTH_WINDOW: Duration = Duration::from_secs(15 * 60);

/// The capacity of the processed pair cache of a balance checker.
pub const PROCESSED_PAIR_CAPACITY: NonZeroUsize =
    NonZeroUsize::new(16_384).expect("non zero capacity");

/// The time to live of a processed pair.
pub const PROCESSED_PAIR_TTL: Duration = Duration::from_secs(30 * 60);

/// The number of dispatched L2 block hashes remembered.
pub const DISPATCHED_BLOCKS_CAPACITY: NonZeroUsize =
    NonZeroUsize::new(4_096).expect("non zero capacity");

/// The number of L1 blocks waiting for the monitor worker. Blocks arriving while the queue is
/// full are skipped.
pub const PENDING_L1_BLOCKS: usize = 1;
