//! Test utils for the bridge monitor.

use crate::{MonitorConfig, TokenPair, WithdrawalConfig};
use std::{sync::Arc, time::Duration};

use alloy_primitives::{address, keccak256, Address, Bytes, LogData, U256};
use alloy_sol_types::SolEvent;
use bridge_monitor_abi::logs::WithdrawalInitiated;
use bridge_monitor_primitives::{ChainBlock, TxRecord};
use bridge_monitor_providers::{
    test_utils::MockChainClient, CacheConfig, LogPagination, Retry, RetryingClient,
};

pub use bridge_monitor_providers::test_utils::{chain_from_timestamps, drifting_timestamps};

/// The L1 bridge of the test configuration.
pub const L1_BRIDGE: Address = address!("0x1000000000000000000000000000000000000001");
/// The L2 bridge of the test configuration.
pub const L2_BRIDGE: Address = address!("0x2000000000000000000000000000000000000002");
/// The L1 token of the test configuration.
pub const L1_TOKEN: Address = address!("0x1000000000000000000000000000000000000010");
/// The L2 token of the test configuration.
pub const L2_TOKEN: Address = address!("0x2000000000000000000000000000000000000020");

/// Returns a [`RetryingClient`] over the mock retrying once, without a cached tip.
pub fn retrying(
    mock: MockChainClient,
    chain: &'static str,
) -> Arc<RetryingClient<MockChainClient>> {
    let cache = CacheConfig { latest_ttl: Duration::ZERO, ..Default::default() };
    Arc::new(RetryingClient::new(mock, chain, Retry::new(1, 1), cache))
}

/// Returns a configuration tracking a single token without decimals, whose L1 and L2 bridges
/// are the watched event contracts.
pub fn test_config() -> MonitorConfig {
    let token = TokenPair::new("TKN", L1_TOKEN, L2_TOKEN, 0);
    let mut config = MonitorConfig::new(1, L1_BRIDGE, L2_BRIDGE);
    config.withdrawals = vec![WithdrawalConfig::new(token.clone())];
    config.tokens = vec![token];
    config.l1_event_contracts = vec![L1_BRIDGE];
    config.l2_event_contracts = vec![L2_BRIDGE];
    config.pagination = LogPagination { batch_delay: Duration::ZERO, ..Default::default() };
    config
}

/// Returns a transaction of the block carrying the logs.
pub fn tx_with_logs(
    block: &ChainBlock,
    index: u8,
    logs: Vec<LogData>,
    address: Address,
) -> TxRecord {
    let logs = logs
        .into_iter()
        .map(|data| MockChainClient::log_with_data(block, data, address))
        .collect();
    TxRecord {
        hash: keccak256([block.hash.as_slice(), &[index]].concat()),
        to: Some(address),
        logs,
        block_number: block.number,
        block_timestamp: block.timestamp,
    }
}

/// Returns the log data of a withdrawal of the L2 token.
pub fn withdrawal(amount: u64) -> LogData {
    WithdrawalInitiated {
        l1Token: L1_TOKEN,
        l2Token: L2_TOKEN,
        from: Address::repeat_byte(0xaa),
        to: Address::repeat_byte(0xaa),
        amount: U256::from(amount),
        extraData: Bytes::new(),
    }
    .encode_log_data()
}
