use std::collections::HashSet;

use alloy_primitives::Address;
use bridge_monitor_abi::WatchedEvent;
use bridge_monitor_primitives::{Finding, TxRecord};

/// Raises a finding for every [`WatchedEvent`] emitted by a watched contract.
#[derive(Debug, Clone)]
pub struct EventWatcher {
    contracts: HashSet<Address>,
    chain: &'static str,
}

impl EventWatcher {
    /// Returns a new [`EventWatcher`] over the contracts of the chain.
    pub fn new(contracts: impl IntoIterator<Item = Address>, chain: &'static str) -> Self {
        Self { contracts: contracts.into_iter().collect(), chain }
    }

    /// Returns the findings of the transaction's logs, in log order.
    pub fn handle_transaction(&self, tx: &TxRecord) -> Vec<Finding> {
        tx.logs
            .iter()
            .filter(|log| self.contracts.contains(&log.address()))
            .filter_map(|log| {
                let event = WatchedEvent::from_log(log)?;
                let finding = event.finding(log, self.chain);
                if finding.is_none() {
                    tracing::debug!(target: "bridge::watcher", ?event, contract = %log.address(), "failed to decode watched event");
                }
                finding
            })
            .collect()
    }
}
