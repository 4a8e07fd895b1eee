use crate::{
    metrics::MonitorMetrics, BalanceChecker, BlockWindow, EventWatcher, L2Synchronizer,
    MonitorConfig, ProxyWatcher, WindowBuilder, WithdrawalMonitor,
};
use std::{sync::Arc, time::Instant};

use alloy_primitives::B256;
use bridge_monitor_primitives::{ChainBlock, Finding};
use bridge_monitor_providers::{ChainClient, LogPagination, NetworkError, RetryingClient};
use futures::future::join_all;
use lru::LruCache;

/// The alert id prefix of a failed window build.
pub const WINDOW_ALERT_ID: &str = "BRIDGE-WINDOW";

/// The alert id prefix of a failed L2 block fetch.
pub const L2_BLOCK_ALERT_ID: &str = "BRIDGE-L2-BLOCK";

/// Runs the checks of an L1 block over its window of L2 blocks.
#[derive(Debug)]
pub struct BridgeProcessor<L1, L2> {
    l2: Arc<RetryingClient<L2>>,
    windows: WindowBuilder<L2>,
    balances: Vec<BalanceChecker<L1, L2>>,
    withdrawals: Vec<WithdrawalMonitor<L2>>,
    proxies: ProxyWatcher<L2>,
    events: EventWatcher,
    pagination: LogPagination,
    /// The L2 blocks already dispatched to the per block consumers.
    dispatched: LruCache<B256, ()>,
    /// The L2 tip at initialization. Blocks up to it are covered by the withdrawal backfill and
    /// the proxy baselines and are never dispatched.
    initialized_at: Option<u64>,
    metrics: MonitorMetrics,
}

impl<L1: ChainClient, L2: ChainClient> BridgeProcessor<L1, L2> {
    /// Returns a new [`BridgeProcessor`] wiring the components of the configuration.
    pub fn new(
        l1: Arc<RetryingClient<L1>>,
        l2: Arc<RetryingClient<L2>>,
        config: &MonitorConfig,
    ) -> Self {
        let synchronizer = Arc::new(L2Synchronizer::new(l2.clone(), config.sync));
        let balances = config
            .tokens
            .iter()
            .map(|token| {
                BalanceChecker::new(l1.clone(), l2.clone(), config.l1_bridge, token.clone())
            })
            .collect();
        let withdrawals = config
            .withdrawals
            .iter()
            .map(|withdrawal| {
                WithdrawalMonitor::new(
                    l2.clone(),
                    synchronizer.clone(),
                    config.l2_bridge,
                    withdrawal.clone(),
                )
            })
            .collect();

        Self {
            windows: WindowBuilder::new(l2.clone(), synchronizer, config.window),
            proxies: ProxyWatcher::new(l2.clone(), config.proxy.clone()),
            events: EventWatcher::new(config.l2_event_contracts.iter().copied(), l2.chain()),
            l2,
            balances,
            withdrawals,
            pagination: config.pagination,
            dispatched: LruCache::new(config.dispatched_capacity),
            initialized_at: None,
            metrics: MonitorMetrics::default(),
        }
    }

    /// Backfills the withdrawal monitors and reads the proxy baselines at the L2 tip.
    pub async fn initialize(&mut self) -> Result<Vec<Finding>, NetworkError> {
        let tip = self.l2.latest_block().await?;
        tracing::info!(target: "bridge::watcher", number = tip.number, hash = %tip.hash, "initializing at L2 tip");

        let mut findings = Vec::new();
        for monitor in &mut self.withdrawals {
            findings.extend(monitor.initialize(&tip, &self.pagination).await);
        }
        findings.extend(self.proxies.initialize(&tip).await);
        self.initialized_at = Some(tip.number);
        Ok(findings)
    }

    /// Returns the findings of the L1 block. Failures are reported as network error findings.
    pub async fn process_l1_block(&mut self, l1_block: &ChainBlock) -> Vec<Finding> {
        let start = Instant::now();
        self.metrics.last_l1_block.set(l1_block.number as f64);

        let findings = match self.windows.build(l1_block).await {
            Ok(window) => self.process_window(l1_block, window).await,
            Err(err) => {
                tracing::warn!(target: "bridge::watcher", number = l1_block.number, %err, "failed to build window");
                vec![Finding::network_error(WINDOW_ALERT_ID, &err)
                    .with_metadata("l1Block", l1_block.number)]
            }
        };

        let network_errors = findings.iter().filter(|finding| finding.is_network_error()).count();
        self.metrics.findings.increment(findings.len() as u64);
        self.metrics.network_errors.increment(network_errors as u64);
        self.metrics.cycle_duration.record(start.elapsed().as_secs_f64());
        tracing::debug!(target: "bridge::watcher", number = l1_block.number, findings = findings.len(), network_errors, "processed L1 block");
        findings
    }

    async fn process_window(&mut self, l1_block: &ChainBlock, window: BlockWindow) -> Vec<Finding> {
        self.metrics.window_size.record(window.blocks.len() as f64);

        let mut findings = Vec::new();
        if let Some(err) = window.abandoned {
            findings.push(
                Finding::network_error(WINDOW_ALERT_ID, err)
                    .with_metadata("l1Block", l1_block.number)
                    .with_metadata("interval", window.interval),
            );
        }

        for block in &window.blocks {
            let checks = self.balances.iter_mut().map(|checker| checker.check(l1_block, block));
            findings.extend(join_all(checks).await.into_iter().flatten());

            if self.should_dispatch(block) {
                findings.extend(self.dispatch(block).await);
            }
        }
        findings
    }

    /// Returns true if the block is newer than the initialization tip and was not dispatched yet.
    fn should_dispatch(&self, block: &ChainBlock) -> bool {
        let covered = self.initialized_at.is_some_and(|tip| block.number <= tip);
        !covered && !self.dispatched.contains(&block.hash)
    }

    /// Feeds the transactions of the L2 block to the per transaction and per block consumers.
    /// A block whose transactions cannot be fetched is dispatched again with the next window.
    async fn dispatch(&mut self, block: &ChainBlock) -> Vec<Finding> {
        let full = match self.l2.block_with_transactions(block.hash).await {
            Ok(full) => full,
            Err(err) => {
                return vec![Finding::network_error(L2_BLOCK_ALERT_ID, err)
                    .with_metadata("l2Block", block.number)]
            }
        };

        let mut findings = Vec::new();
        for tx in &full.transactions {
            for monitor in &mut self.withdrawals {
                monitor.handle_transaction(tx);
            }
            findings.extend(self.events.handle_transaction(tx));
        }
        findings
            .extend(self.withdrawals.iter_mut().filter_map(|monitor| monitor.handle_block(block)));
        findings.extend(self.proxies.handle_block(block).await);

        self.dispatched.put(block.hash, ());
        self.metrics.last_l2_block.set(block.number as f64);
        findings
    }
}
