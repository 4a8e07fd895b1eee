use crate::{ProxyConfig, WatchedProxy};
use std::sync::Arc;

use alloy_primitives::Address;
use bridge_monitor_primitives::{ChainBlock, Finding, FindingType, Severity};
use bridge_monitor_providers::{ChainClient, NetworkError, RetryingClient};

/// The alert id of a proxy slot drift.
pub const PROXY_ALERT_ID: &str = "BRIDGE-PROXY-DRIFT";

/// The last successfully observed EIP-1967 slots of a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyState {
    /// The watched proxy.
    pub proxy: WatchedProxy,
    /// The last observed implementation.
    pub implementation: Option<Address>,
    /// The last observed admin.
    pub admin: Option<Address>,
}

/// The polled slot of a proxy.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Implementation,
    Admin,
}

impl Slot {
    const fn name(&self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Admin => "admin",
        }
    }
}

/// Polls the EIP-1967 slots of proxies for changes.
#[derive(Debug)]
pub struct ProxyWatcher<C> {
    client: Arc<RetryingClient<C>>,
    states: Vec<ProxyState>,
    poll_interval: u64,
    /// The number of the last polled block. Older blocks are not polled.
    polled_at: Option<u64>,
}

impl<C: ChainClient> ProxyWatcher<C> {
    /// Returns a new [`ProxyWatcher`] without baselines.
    pub fn new(client: Arc<RetryingClient<C>>, config: ProxyConfig) -> Self {
        let states = config
            .proxies
            .into_iter()
            .map(|proxy| ProxyState { proxy, implementation: None, admin: None })
            .collect();
        Self { client, states, poll_interval: config.poll_interval.max(1), polled_at: None }
    }

    /// Returns the proxy states.
    pub fn states(&self) -> &[ProxyState] {
        &self.states
    }

    /// Reads the baselines at the block.
    pub async fn initialize(&mut self, block: &ChainBlock) -> Vec<Finding> {
        self.poll(block).await
    }

    /// Polls the proxies if the block number is a multiple of the poll interval and the block
    /// is newer than the last polled one.
    pub async fn handle_block(&mut self, block: &ChainBlock) -> Vec<Finding> {
        if block.number % self.poll_interval != 0 ||
            self.polled_at.is_some_and(|number| block.number <= number)
        {
            return Vec::new();
        }
        self.poll(block).await
    }

    async fn poll(&mut self, block: &ChainBlock) -> Vec<Finding> {
        self.polled_at = Some(block.number);
        let mut findings = Vec::new();
        for state in &mut self.states {
            let address = state.proxy.address;
            let (implementation, admin) = tokio::join!(
                self.client.proxy_implementation(address, block.hash),
                self.client.proxy_admin(address, block.hash)
            );
            findings.extend(Self::observe(state, Slot::Implementation, implementation, block));
            findings.extend(Self::observe(state, Slot::Admin, admin, block));
        }
        findings
    }

    /// Compares an observed value to the baseline. A failed read leaves the baseline as is.
    fn observe(
        state: &mut ProxyState,
        slot: Slot,
        observed: Result<Address, NetworkError>,
        block: &ChainBlock,
    ) -> Option<Finding> {
        let observed = match observed {
            Ok(observed) => observed,
            Err(err) => {
                return Some(
                    Finding::network_error(PROXY_ALERT_ID, err)
                        .with_metadata("proxy", state.proxy.address)
                        .with_metadata("slot", slot.name()),
                )
            }
        };
        let baseline = match slot {
            Slot::Implementation => &mut state.implementation,
            Slot::Admin => &mut state.admin,
        };
        let previous = baseline.replace(observed)?;
        if previous == observed {
            return None;
        }

        let name = &state.proxy.name;
        tracing::warn!(target: "bridge::watcher", proxy = %name, slot = slot.name(), %previous, %observed, "proxy slot changed");
        Some(
            Finding::new(
                PROXY_ALERT_ID,
                format!("{name} proxy {} changed", slot.name()),
                format!("{name} {} changed from {previous} to {observed}", slot.name()),
                Severity::High,
                FindingType::Suspicious,
            )
            .with_metadata("proxy", state.proxy.address)
            .with_metadata("slot", slot.name())
            .with_metadata("previous", previous)
            .with_metadata("current", observed)
            .with_metadata("l2Block", block.number),
        )
    }
}
