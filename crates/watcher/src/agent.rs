use crate::{
    metrics::MonitorMetrics, AgentError, BridgeProcessor, ConfigError, EventWatcher,
    FindingsBuffer, HealthChecker, HealthStatus, MonitorConfig, MonitorHandle, MonitorWorker,
};
use std::sync::Arc;

use bridge_monitor_primitives::{ChainBlock, EvaluateResponse, TxRecord};
use bridge_monitor_providers::{ChainClient, RetryingClient};
use parking_lot::Mutex;

/// The entry point of the bridge monitor.
///
/// [`BridgeAgent::handle_block`] never waits for the checks of the L1 block it is given: it
/// queues the block for the background worker and returns the findings the worker reported
/// since the previous call. Findings therefore surface one or more L1 blocks late. A block
/// arriving while another one is already waiting for the worker is skipped.
#[derive(Debug)]
pub struct BridgeAgent<L1, L2> {
    l1: Arc<RetryingClient<L1>>,
    l2: Arc<RetryingClient<L2>>,
    config: MonitorConfig,
    l1_events: EventWatcher,
    buffer: FindingsBuffer,
    handle: Option<MonitorHandle>,
    health: Mutex<HealthChecker>,
    metrics: MonitorMetrics,
}

impl<L1, L2> BridgeAgent<L1, L2>
where
    L1: ChainClient + 'static,
    L2: ChainClient + 'static,
{
    /// Returns a new uninitialized [`BridgeAgent`].
    pub fn new(
        l1: Arc<RetryingClient<L1>>,
        l2: Arc<RetryingClient<L2>>,
        config: MonitorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let metrics = MonitorMetrics::default();
        metrics.healthy.set(1.0);
        Ok(Self {
            l1_events: EventWatcher::new(config.l1_event_contracts.iter().copied(), l1.chain()),
            health: Mutex::new(HealthChecker::new(config.health)),
            buffer: FindingsBuffer::default(),
            handle: None,
            l1,
            l2,
            config,
            metrics,
        })
    }

    /// Backfills the monitors and spawns the background worker. Must complete before blocks
    /// and transactions are served.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        if self.handle.is_some() {
            return Err(AgentError::AlreadyInitialized);
        }

        let mut processor = BridgeProcessor::new(self.l1.clone(), self.l2.clone(), &self.config);
        let findings = processor.initialize().await?;
        if !findings.is_empty() {
            tracing::warn!(target: "bridge::watcher", count = findings.len(), "initialization reported findings");
        }
        self.buffer.extend(findings);
        self.handle = Some(MonitorWorker::spawn(processor, self.buffer.clone()));

        tracing::info!(target: "bridge::watcher", chain_id = self.config.l2_chain_id, tokens = self.config.tokens.len(), proxies = self.config.proxy.proxies.len(), "bridge agent initialized");
        Ok(())
    }

    /// Returns true once [`BridgeAgent::initialize`] completed.
    pub const fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Queues the L1 block for processing and returns the findings reported since the previous
    /// call.
    pub fn handle_block(&self, block: ChainBlock) -> EvaluateResponse {
        let handle = match self.active_handle() {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(target: "bridge::watcher", number = block.number, %err, "rejecting block");
                return EvaluateResponse::error(Vec::new());
            }
        };

        let findings = handle.drain();
        let status = self.health.lock().check(&findings);
        self.metrics.healthy.set(if status == HealthStatus::Healthy { 1.0 } else { 0.0 });

        match handle.process_l1_block(block) {
            Ok(true) => EvaluateResponse::success(findings),
            Ok(false) => {
                self.metrics.skipped_l1_blocks.increment(1);
                tracing::warn!(target: "bridge::watcher", number = block.number, "monitor worker busy, skipping L1 block");
                EvaluateResponse::success(findings)
            }
            Err(_) => EvaluateResponse::error(findings),
        }
    }

    /// Returns the findings of the events emitted by the watched L1 contracts in the
    /// transaction.
    pub fn handle_transaction(&self, tx: &TxRecord) -> EvaluateResponse {
        if let Err(err) = self.active_handle() {
            tracing::warn!(target: "bridge::watcher", tx = %tx.hash, %err, "rejecting transaction");
            return EvaluateResponse::error(Vec::new());
        }
        EvaluateResponse::success(self.l1_events.handle_transaction(tx))
    }

    /// Returns the number of findings waiting for the next [`BridgeAgent::handle_block`].
    pub fn pending_findings(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true until the network errors reported within the health window reach the
    /// ceiling.
    pub fn is_healthy(&self) -> bool {
        self.health.lock().is_healthy()
    }

    fn active_handle(&self) -> Result<&MonitorHandle, AgentError> {
        let handle = self.handle.as_ref().ok_or(AgentError::NotInitialized)?;
        if handle.is_closed() {
            return Err(AgentError::Shutdown);
        }
        Ok(handle)
    }
}
