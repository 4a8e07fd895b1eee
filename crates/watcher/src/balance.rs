use crate::{constants, TokenPair};
use std::sync::Arc;

use alloy_primitives::{utils::format_units, Address, U256};
use bridge_monitor_primitives::{ChainBlock, Finding, FindingType, Severity};
use bridge_monitor_providers::{ChainClient, RetryingClient, TtlCache};

/// The alert id of a collateral shortfall.
pub const BALANCE_ALERT_ID: &str = "BRIDGE-BALANCE";

/// Checks that the L2 supply of a bridged token is covered by the L1 collateral escrowed by
/// the bridge.
#[derive(Debug)]
pub struct BalanceChecker<L1, L2> {
    l1: Arc<RetryingClient<L1>>,
    l2: Arc<RetryingClient<L2>>,
    l1_bridge: Address,
    token: TokenPair,
    processed: TtlCache<(u64, u64), ()>,
}

impl<L1: ChainClient, L2: ChainClient> BalanceChecker<L1, L2> {
    /// Returns a new [`BalanceChecker`] for the token escrowed by `l1_bridge`.
    pub fn new(
        l1: Arc<RetryingClient<L1>>,
        l2: Arc<RetryingClient<L2>>,
        l1_bridge: Address,
        token: TokenPair,
    ) -> Self {
        Self {
            l1,
            l2,
            l1_bridge,
            token,
            processed: TtlCache::new(
                constants::PROCESSED_PAIR_CAPACITY,
                constants::PROCESSED_PAIR_TTL,
            ),
        }
    }

    /// Returns the checked token.
    pub const fn token(&self) -> &TokenPair {
        &self.token
    }

    /// Compares the L1 collateral at `l1_block` to the L2 supply at `l2_block`. Each pair is
    /// evaluated once; a pair with a failed read is not marked and is evaluated again on the
    /// next call.
    pub async fn check(&mut self, l1_block: &ChainBlock, l2_block: &ChainBlock) -> Vec<Finding> {
        let key = (l1_block.number, l2_block.number);
        if self.processed.contains(&key) {
            return Vec::new();
        }

        let (balance, supply) = tokio::join!(
            self.l1.erc20_balance(self.token.l1_token, self.l1_bridge, l1_block.hash),
            self.l2.erc20_total_supply(self.token.l2_token, l2_block.hash)
        );

        let (balance, supply) = match (balance, supply) {
            (Ok(balance), Ok(supply)) => (balance, supply),
            (balance, supply) => {
                let prefix = format!("{BALANCE_ALERT_ID}-{}", self.token.symbol);
                let findings = [balance.err(), supply.err()]
                    .into_iter()
                    .flatten()
                    .map(|err| {
                        Finding::network_error(&prefix, &err)
                            .with_metadata("l1Block", l1_block.number)
                            .with_metadata("l2Block", l2_block.number)
                    })
                    .collect();
                return findings;
            }
        };

        self.processed.insert(key, ());
        if supply <= balance {
            return Vec::new();
        }

        tracing::warn!(target: "bridge::watcher", token = %self.token.symbol, %balance, %supply, l1_block = l1_block.number, l2_block = l2_block.number, "L2 supply exceeds L1 collateral");
        vec![self.shortfall(l1_block, l2_block, balance, supply)]
    }

    fn shortfall(
        &self,
        l1_block: &ChainBlock,
        l2_block: &ChainBlock,
        balance: U256,
        supply: U256,
    ) -> Finding {
        let format = |amount: U256| {
            format_units(amount, self.token.decimals).unwrap_or_else(|_| amount.to_string())
        };
        let symbol = &self.token.symbol;
        let description = format!(
            "L2 {symbol} supply {} at block {} exceeds L1 collateral {} at block {}",
            format(supply),
            l2_block.number,
            format(balance),
            l1_block.number,
        );
        Finding::new(
            BALANCE_ALERT_ID,
            format!("{symbol} bridge balance violation"),
            description,
            Severity::Critical,
            FindingType::Suspicious,
        )
        .with_unique_key(format!("{}-{}-{symbol}", l1_block.number, l2_block.number))
        .with_metadata("token", symbol)
        .with_metadata("l1Balance", balance)
        .with_metadata("l2Supply", supply)
        .with_metadata("l1Block", l1_block.number)
        .with_metadata("l2Block", l2_block.number)
    }
}
