use crate::{constants, BridgeProcessor, FindingsBuffer, MonitorCommand, MonitorHandle};
use std::{any::Any, panic::AssertUnwindSafe};

use bridge_monitor_primitives::{Finding, FindingType, Severity};
use bridge_monitor_providers::ChainClient;
use futures::FutureExt;
use tokio::sync::mpsc;

/// The alert id of a processing cycle that panicked.
pub const WORKER_ALERT_ID: &str = "BRIDGE-MONITOR-FAILURE";

/// Processes the queued L1 blocks one at a time, in arrival order, and reports their findings
/// to the shared buffer. At most [`constants::PENDING_L1_BLOCKS`] blocks wait behind the one in
/// progress.
#[derive(Debug)]
pub struct MonitorWorker<L1, L2> {
    processor: BridgeProcessor<L1, L2>,
    from_handle_rx: mpsc::Receiver<MonitorCommand>,
    buffer: FindingsBuffer,
}

impl<L1, L2> MonitorWorker<L1, L2>
where
    L1: ChainClient + 'static,
    L2: ChainClient + 'static,
{
    /// Spawns the worker and returns its handle.
    pub fn spawn(processor: BridgeProcessor<L1, L2>, buffer: FindingsBuffer) -> MonitorHandle {
        let (tx, rx) = mpsc::channel(constants::PENDING_L1_BLOCKS);
        let worker = Self { processor, from_handle_rx: rx, buffer: buffer.clone() };
        tokio::spawn(worker.run());
        MonitorHandle::new(tx, buffer)
    }

    /// Runs the worker until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.from_handle_rx.recv().await {
            match command {
                MonitorCommand::ProcessL1Block(block) => {
                    let cycle = AssertUnwindSafe(self.processor.process_l1_block(&block));
                    let findings = match cycle.catch_unwind().await {
                        Ok(findings) => findings,
                        Err(panic) => {
                            let message = panic_message(panic.as_ref());
                            tracing::error!(target: "bridge::watcher", number = block.number, %message, "processing cycle panicked");
                            vec![Finding::new(
                                WORKER_ALERT_ID,
                                "Monitor processing failed",
                                format!(
                                    "processing of L1 block {} failed: {message}",
                                    block.number
                                ),
                                Severity::Unknown,
                                FindingType::Degraded,
                            )
                            .with_metadata("l1Block", block.number)]
                        }
                    };
                    self.buffer.extend(findings);
                }
            }
        }
        tracing::info!(target: "bridge::watcher", "monitor worker stopped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    panic.downcast_ref::<String>().cloned().unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        chain_from_timestamps, retrying, test_config, L1_BRIDGE, L1_TOKEN, L2_TOKEN,
    };
    use std::time::Duration;

    use alloy_primitives::{B256, U256};
    use bridge_monitor_primitives::ChainBlock;
    use bridge_monitor_providers::{test_utils::MockChainClient, RpcMethod};

    const BASE: u64 = 1_700_000_000;

    async fn next_findings(buffer: &FindingsBuffer) -> eyre::Result<Vec<Finding>> {
        for _ in 0..500 {
            if !buffer.is_empty() {
                return Ok(buffer.drain());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        eyre::bail!("worker reported no findings")
    }

    #[tokio::test]
    async fn test_panicking_cycle_is_reported_and_worker_keeps_serving() -> eyre::Result<()> {
        // Given: an L2 supply above the L1 collateral.
        let timestamps: Vec<u64> = (0..500).map(|n| BASE + 2 * n).collect();
        let l1 = MockChainClient::new(Vec::new());
        l1.set_balance(L1_TOKEN, L1_BRIDGE, U256::from(100));
        let l2 = MockChainClient::new(chain_from_timestamps(2, &timestamps));
        l2.set_total_supply(L2_TOKEN, U256::from(101));
        let l2 = retrying(l2, "l2");
        let mut processor = BridgeProcessor::new(retrying(l1, "l1"), l2.clone(), &test_config());
        processor.initialize().await?;
        let buffer = FindingsBuffer::default();
        let handle = MonitorWorker::spawn(processor, buffer.clone());
        let l1_block = |number: u8| {
            ChainBlock::new(B256::with_last_byte(number), B256::ZERO, number.into(), BASE + 800)
        };

        // When: the first cycle panics reading the L2 tip.
        l2.inner().panic_on(RpcMethod::LatestBlock);
        assert!(handle.process_l1_block(l1_block(1))?);
        let first = next_findings(&buffer).await?;
        l2.inner().recover(RpcMethod::LatestBlock);
        assert!(handle.process_l1_block(l1_block(2))?);
        let second = next_findings(&buffer).await?;

        // Then
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].alert_id, WORKER_ALERT_ID);
        assert_eq!(first[0].finding_type, FindingType::Degraded);
        assert_eq!(first[0].severity, Severity::Unknown);
        assert!(first[0].description.contains("mock client panicked"));
        assert_eq!(first[0].metadata.get("l1Block").map(String::as_str), Some("1"));
        assert_eq!(second.len(), 415);
        assert!(!handle.is_closed());

        Ok(())
    }

    #[test]
    fn test_panic_message_of_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
