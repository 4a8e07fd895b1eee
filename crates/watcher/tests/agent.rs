//! Integration tests of the bridge agent and its background worker.
#![cfg(feature = "test-utils")]

use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use bridge_monitor_abi::logs::Paused;
use bridge_monitor_primitives::{ChainBlock, ResponseStatus, Severity};
use bridge_monitor_providers::{test_utils::MockChainClient, RetryingClient, RpcMethod};
use bridge_monitor_watcher::{
    test_utils::{
        chain_from_timestamps, retrying, test_config, tx_with_logs, L1_BRIDGE, L1_TOKEN, L2_TOKEN,
    },
    AgentError, BridgeAgent, MonitorConfig, BALANCE_ALERT_ID,
};

const BASE: u64 = 1_700_000_000;

type Agent = BridgeAgent<MockChainClient, MockChainClient>;

/// Returns an agent over an L2 chain of 500 blocks, two seconds apart, whose bridge holds 100
/// tokens on L1.
fn agent(
    supply: u64,
    config: MonitorConfig,
) -> eyre::Result<(Agent, Arc<RetryingClient<MockChainClient>>)> {
    let timestamps: Vec<u64> = (0..500).map(|n| BASE + 2 * n).collect();
    let l1 = MockChainClient::new(Vec::new());
    l1.set_balance(L1_TOKEN, L1_BRIDGE, U256::from(100));
    let l2 = MockChainClient::new(chain_from_timestamps(2, &timestamps));
    l2.set_total_supply(L2_TOKEN, U256::from(supply));
    let l2 = retrying(l2, "l2");
    let agent = BridgeAgent::new(retrying(l1, "l1"), l2.clone(), config)?;
    Ok((agent, l2))
}

fn l1_block(number: u64, timestamp: u64) -> ChainBlock {
    ChainBlock::new(B256::with_last_byte(number as u8), B256::ZERO, number, timestamp)
}

/// Waits for the worker to report findings.
async fn wait_for_findings(agent: &Agent) -> eyre::Result<()> {
    for _ in 0..500 {
        if agent.pending_findings() > 0 {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    eyre::bail!("worker reported no findings")
}

#[tokio::test]
async fn test_uninitialized_agent_rejects_requests() -> eyre::Result<()> {
    let (agent, _) = agent(100, test_config())?;

    let response = agent.handle_block(l1_block(1, BASE + 800));
    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.findings.is_empty());

    let tx = tx_with_logs(&ChainBlock::default(), 0, Vec::new(), L1_BRIDGE);
    assert_eq!(agent.handle_transaction(&tx).status, ResponseStatus::Error);

    Ok(())
}

#[tokio::test]
async fn test_agent_initializes_once() -> eyre::Result<()> {
    let (mut agent, _) = agent(100, test_config())?;

    agent.initialize().await?;

    assert!(agent.is_initialized());
    assert!(matches!(agent.initialize().await, Err(AgentError::AlreadyInitialized)));

    Ok(())
}

#[tokio::test]
async fn test_block_findings_surface_on_next_call() -> eyre::Result<()> {
    // Given
    let (mut agent, _) = agent(101, test_config())?;
    agent.initialize().await?;

    // When: the first call only queues the block.
    let first = agent.handle_block(l1_block(1, BASE + 800));
    wait_for_findings(&agent).await?;
    let second = agent.handle_block(l1_block(2, BASE + 812));

    // Then
    assert!(first.is_success());
    assert!(first.findings.is_empty());
    assert!(second.is_success());
    assert_eq!(second.findings.len(), 415);
    assert!(second.findings.iter().all(|finding| {
        finding.alert_id == BALANCE_ALERT_ID && finding.severity == Severity::Critical
    }));

    Ok(())
}

#[tokio::test]
async fn test_l1_transaction_events_are_evaluated_synchronously() -> eyre::Result<()> {
    // Given
    let (mut agent, _) = agent(100, test_config())?;
    agent.initialize().await?;
    let block = l1_block(1, BASE);
    let paused = Paused { account: Address::repeat_byte(3) }.encode_log_data();
    let tx = tx_with_logs(&block, 0, vec![paused], L1_BRIDGE);

    // When
    let response = agent.handle_transaction(&tx);

    // Then
    assert!(response.is_success());
    assert_eq!(response.findings.len(), 1);
    assert_eq!(response.findings[0].alert_id, "BRIDGE-PAUSED");
    assert_eq!(response.findings[0].severity, Severity::Critical);
    assert_eq!(response.findings[0].metadata.get("chain").map(String::as_str), Some("l1"));

    Ok(())
}

#[tokio::test]
async fn test_repeated_network_errors_make_agent_unhealthy() -> eyre::Result<()> {
    // Given: every cycle reports a single network error.
    let mut config = test_config();
    config.health.error_ceiling = 2;
    let (mut agent, l2) = agent(100, config)?;
    agent.initialize().await?;
    l2.inner().fail_always(RpcMethod::LatestBlock);

    // When
    agent.handle_block(l1_block(1, BASE));
    wait_for_findings(&agent).await?;
    let second = agent.handle_block(l1_block(2, BASE + 12));
    assert!(agent.is_healthy());
    wait_for_findings(&agent).await?;
    let third = agent.handle_block(l1_block(3, BASE + 24));

    // Then
    assert_eq!(second.findings.len(), 1);
    assert!(second.findings[0].is_network_error());
    assert_eq!(third.findings.len(), 1);
    assert!(!agent.is_healthy());
    assert!(third.is_success());

    Ok(())
}
