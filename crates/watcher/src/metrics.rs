use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

/// The metrics for the bridge monitor.
#[derive(Metrics, Clone)]
#[metrics(scope = "bridge_monitor")]
pub struct MonitorMetrics {
    /// The number of the last L1 block processed.
    pub last_l1_block: Gauge,
    /// The number of the last L2 block processed.
    pub last_l2_block: Gauge,
    /// Set to one while the monitor is healthy.
    pub healthy: Gauge,
    /// The number of findings reported.
    pub findings: Counter,
    /// The number of network error findings reported.
    pub network_errors: Counter,
    /// The number of L1 blocks skipped while the worker was busy.
    pub skipped_l1_blocks: Counter,
    /// The number of L2 blocks in the window of an L1 block.
    pub window_size: Histogram,
    /// The duration of the processing of an L1 block.
    pub cycle_duration: Histogram,
}

/// The metrics for the [`crate::L2Synchronizer`].
#[derive(Metrics, Clone)]
#[metrics(scope = "bridge_monitor_sync")]
pub struct SynchronizerMetrics {
    /// The number of block fetches of a search.
    pub search_steps: Histogram,
    /// The number of searches that failed.
    pub search_failures: Counter,
}
