use std::{collections::HashMap, fmt, time::Duration};

use metrics::{Counter, Histogram};
use metrics_derive::Metrics;
use strum::{EnumIter, IntoEnumIterator};

/// The chain reads issued by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum RpcMethod {
    /// `eth_getBlockByNumber`.
    BlockByNumber,
    /// `eth_getBlockByHash`.
    BlockByHash,
    /// `eth_getBlockByNumber("latest")`.
    LatestBlock,
    /// `eth_getBlockByHash` with full transactions, along with the block logs.
    BlockWithTransactions,
    /// `eth_getLogs`.
    Logs,
    /// `eth_call`.
    Call,
    /// `eth_getStorageAt`.
    StorageAt,
}

impl RpcMethod {
    /// Returns the str representation of the [`RpcMethod`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BlockByNumber => "eth_getBlockByNumber",
            Self::BlockByHash => "eth_getBlockByHash",
            Self::LatestBlock => "eth_getBlockByNumber(latest)",
            Self::BlockWithTransactions => "eth_getBlockByHash(full)",
            Self::Logs => "eth_getLogs",
            Self::Call => "eth_call",
            Self::StorageAt => "eth_getStorageAt",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The RPC metrics of a single chain client, labelled per [`RpcMethod`].
#[derive(Debug)]
pub(crate) struct RpcMetricsHandler {
    methods: HashMap<RpcMethod, RpcMetrics>,
}

impl RpcMetricsHandler {
    /// Returns a new handler with metrics labelled with the chain name.
    pub(crate) fn new(chain: &'static str) -> Self {
        Self {
            methods: RpcMethod::iter()
                .map(|method| {
                    let labels = [("method", method.as_str()), ("chain", chain)];
                    (method, RpcMetrics::new_with_labels(&labels))
                })
                .collect(),
        }
    }

    /// Records the outcome of a call.
    pub(crate) fn record(
        &self,
        method: RpcMethod,
        success: bool,
        attempts: usize,
        duration: Duration,
    ) {
        let Some(metrics) = self.methods.get(&method) else { return };
        if success {
            metrics.calls_success.increment(1);
        } else {
            metrics.calls_failed.increment(1);
        }
        metrics.retries.increment(attempts.saturating_sub(1) as u64);
        metrics.call_duration.record(duration.as_secs_f64());
    }
}

/// The metrics for a chain read method.
#[derive(Metrics, Clone)]
#[metrics(scope = "bridge_monitor_rpc")]
pub(crate) struct RpcMetrics {
    /// The number of calls that succeeded, retries included.
    calls_success: Counter,
    /// The number of calls that failed after exhausting their retries.
    calls_failed: Counter,
    /// The number of retried attempts.
    retries: Counter,
    /// The duration of a call, retries included.
    call_duration: Histogram,
}
