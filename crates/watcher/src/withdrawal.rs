use crate::{sync::Direction, L2Synchronizer, WithdrawalConfig};
use std::{collections::VecDeque, sync::Arc};

use alloy_primitives::{utils::format_units, Address, U256};
use alloy_sol_types::SolEvent;
use bridge_monitor_abi::logs::{try_decode_log, WithdrawalInitiated};
use bridge_monitor_primitives::{
    ChainBlock, Finding, FindingType, LogEntry, Severity, TxRecord, WithdrawalRecord,
};
use bridge_monitor_providers::{ChainClient, LogPagination, LogQuery, RetryingClient};

/// The alert id of an anomalous withdrawal volume.
pub const WITHDRAWAL_ALERT_ID: &str = "BRIDGE-WITHDRAWAL-VOLUME";

/// Tracks the withdrawal volume of a token over a rolling window and alerts when it crosses a
/// threshold.
#[derive(Debug)]
pub struct WithdrawalMonitor<C> {
    client: Arc<RetryingClient<C>>,
    synchronizer: Arc<L2Synchronizer<C>>,
    l2_bridge: Address,
    config: WithdrawalConfig,
    threshold: U256,
    records: VecDeque<WithdrawalRecord>,
}

impl<C: ChainClient> WithdrawalMonitor<C> {
    /// Returns a new [`WithdrawalMonitor`] over the withdrawals initiated on `l2_bridge`.
    pub fn new(
        client: Arc<RetryingClient<C>>,
        synchronizer: Arc<L2Synchronizer<C>>,
        l2_bridge: Address,
        config: WithdrawalConfig,
    ) -> Self {
        let threshold = config.threshold();
        Self { client, synchronizer, l2_bridge, config, threshold, records: VecDeque::new() }
    }

    /// Returns the tracked records, oldest first.
    pub const fn records(&self) -> &VecDeque<WithdrawalRecord> {
        &self.records
    }

    /// Returns the summed amount of the tracked records.
    pub fn volume(&self) -> U256 {
        self.records.iter().fold(U256::ZERO, |sum, record| sum.saturating_add(record.amount))
    }

    /// Backfills the records of the rolling window ending at `tip`.
    pub async fn initialize(
        &mut self,
        tip: &ChainBlock,
        pagination: &LogPagination,
    ) -> Vec<Finding> {
        let window = self.config.window.as_secs();
        let since = tip.timestamp.saturating_sub(window);
        let from = match self.synchronizer.find(since, *tip, Direction::Left).await {
            Ok(block) => block.number,
            Err(err) => {
                let estimate = tip.number.saturating_sub(window / self.config.block_time.max(1));
                tracing::warn!(target: "bridge::watcher", %err, from = estimate, "estimating withdrawal backfill start");
                estimate
            }
        };

        let query = LogQuery::new(
            vec![self.l2_bridge],
            vec![WithdrawalInitiated::SIGNATURE_HASH],
            from,
            tip.number,
        );
        let logs = self.client.logs_paginated(&query, pagination).await;

        let mut findings = Vec::new();
        for log in &logs {
            let Some(amount) = self.tracked_amount(log) else { continue };
            let timestamp = match self.log_timestamp(log, tip).await {
                Ok(timestamp) => timestamp,
                Err(finding) => {
                    findings.push(*finding);
                    continue;
                }
            };
            if timestamp + window > tip.timestamp {
                self.records.push_back(WithdrawalRecord::new(timestamp, amount));
            }
        }
        self.records.make_contiguous().sort_by_key(|record| record.timestamp);

        tracing::info!(target: "bridge::watcher", token = %self.config.token.symbol, from, to = tip.number, records = self.records.len(), volume = %self.volume(), "backfilled withdrawals");
        findings
    }

    async fn log_timestamp(&self, log: &LogEntry, tip: &ChainBlock) -> Result<u64, Box<Finding>> {
        if let Some(timestamp) = log.block_timestamp {
            return Ok(timestamp);
        }
        match log.block_hash {
            Some(hash) => self
                .client
                .block_by_hash(hash)
                .await
                .map(|block| block.timestamp)
                .map_err(|err| Box::new(Finding::network_error(WITHDRAWAL_ALERT_ID, err))),
            None => {
                let behind = tip.number.saturating_sub(log.block_number.unwrap_or(tip.number));
                Ok(tip.timestamp.saturating_sub(behind * self.config.block_time))
            }
        }
    }

    /// Returns the withdrawn amount if the log is a withdrawal of the tracked token.
    fn tracked_amount(&self, log: &LogEntry) -> Option<U256> {
        if log.address() != self.l2_bridge {
            return None;
        }
        let event = try_decode_log::<WithdrawalInitiated>(&log.inner)?;
        (event.data.l2Token == self.config.token.l2_token).then_some(event.data.amount)
    }

    /// Records the withdrawals of the transaction.
    pub fn handle_transaction(&mut self, tx: &TxRecord) {
        for log in &tx.logs {
            if let Some(amount) = self.tracked_amount(log) {
                self.records.push_back(WithdrawalRecord::new(tx.block_timestamp, amount));
            }
        }
    }

    /// Prunes the records out of the rolling window ending at the block and alerts if the
    /// volume reaches the threshold. Alerts are only raised at block numbers multiple of the
    /// configured modulus, which approximates one alert per crossing.
    pub fn handle_block(&mut self, block: &ChainBlock) -> Option<Finding> {
        let cutoff = block.timestamp.saturating_sub(self.config.window.as_secs());
        self.records.retain(|record| record.timestamp > cutoff);

        let volume = self.volume();
        if volume < self.threshold || block.number % self.config.alert_modulus != 0 {
            return None;
        }

        let token = &self.config.token;
        let hours = self.config.window.as_secs() / 3600;
        let amount = format_units(volume, token.decimals).unwrap_or_else(|_| volume.to_string());
        tracing::warn!(target: "bridge::watcher", token = %token.symbol, %volume, block = block.number, "withdrawal volume above threshold");
        let finding = Finding::new(
            WITHDRAWAL_ALERT_ID,
            format!("High {} withdrawal volume", token.symbol),
            format!("{amount} {} withdrawn in the last {hours}h", token.symbol),
            Severity::Medium,
            FindingType::Suspicious,
        )
        .with_metadata("token", &token.symbol)
        .with_metadata("volume", volume)
        .with_metadata("lookbackHours", hours)
        .with_metadata("l2Block", block.number);

        self.records.retain(|record| record.timestamp > block.timestamp);
        Some(finding)
    }
}
