use crate::constants;

use bridge_monitor_providers::Retry;
use bridge_monitor_watcher::OP_MAINNET_CHAIN_ID;

/// The bridge monitor command line arguments.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "bridge-monitor", version, about = "Monitors an L1/L2 token bridge")]
pub(crate) struct MonitorArgs {
    /// The L1 provider arguments.
    #[command(flatten)]
    pub(crate) l1: L1ProviderArgs,
    /// The L2 provider arguments.
    #[command(flatten)]
    pub(crate) l2: L2ProviderArgs,
    /// The chain read arguments.
    #[command(flatten)]
    pub(crate) rpc: RpcArgs,
}

impl MonitorArgs {
    /// Returns the retry policy of chain reads.
    pub(crate) const fn retry(&self) -> Retry {
        Retry::new(self.rpc.max_retries, self.rpc.retry_delay_ms)
    }
}

/// The arguments for the L1 provider.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct L1ProviderArgs {
    /// The URL for the L1 RPC.
    #[arg(long = "l1.url", id = "l1_url", value_name = "L1_URL", env = "BRIDGE_MONITOR_L1_URL")]
    pub(crate) url: reqwest::Url,
    /// The interval between two polls of the L1 head, in milliseconds.
    #[arg(
        long = "l1.poll-interval",
        id = "l1_poll_interval",
        value_name = "L1_POLL_INTERVAL",
        default_value_t = constants::L1_POLL_INTERVAL_MS
    )]
    pub(crate) poll_interval_ms: u64,
}

/// The arguments for the L2 provider.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct L2ProviderArgs {
    /// The URL for the L2 RPC.
    #[arg(long = "l2.url", id = "l2_url", value_name = "L2_URL", env = "BRIDGE_MONITOR_L2_URL")]
    pub(crate) url: reqwest::Url,
    /// The chain id of the L2, selecting the monitored bridge.
    #[arg(
        long = "l2.chain-id",
        id = "l2_chain_id",
        value_name = "L2_CHAIN_ID",
        env = "BRIDGE_MONITOR_L2_CHAIN_ID",
        default_value_t = OP_MAINNET_CHAIN_ID
    )]
    pub(crate) chain_id: u64,
}

/// The arguments for chain reads.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RpcArgs {
    /// The number of retries of a failed chain read.
    #[arg(
        long = "rpc.max-retries",
        id = "rpc_max_retries",
        value_name = "RPC_MAX_RETRIES",
        default_value_t = constants::RPC_MAX_RETRIES
    )]
    pub(crate) max_retries: usize,
    /// The delay between two attempts of a chain read, in milliseconds.
    #[arg(
        long = "rpc.retry-delay",
        id = "rpc_retry_delay",
        value_name = "RPC_RETRY_DELAY",
        default_value_t = constants::RPC_RETRY_DELAY_MS
    )]
    pub(crate) retry_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_defaults() {
        let args = MonitorArgs::parse_from([
            "bridge-monitor",
            "--l1.url",
            "http://localhost:8545",
            "--l2.url",
            "http://localhost:9545",
        ]);

        assert_eq!(args.l2.chain_id, OP_MAINNET_CHAIN_ID);
        assert_eq!(args.l1.poll_interval_ms, 12_000);
        assert_eq!(args.retry().max_attempts(), 5);
        assert_eq!(args.retry().delay_ms, 500);
    }
}
