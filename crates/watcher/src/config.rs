//! Configuration of the bridge monitor.

use crate::{constants, ConfigError};
use std::{num::NonZeroUsize, time::Duration};

use alloy_primitives::{address, Address, U256};
use bridge_monitor_providers::LogPagination;

/// The configuration of the [`crate::L2Synchronizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynchronizerConfig {
    /// The number of blocks the search bracket is extended by when it misses the target.
    pub extension_offset: u64,
    /// The maximum number of block fetches of a single search.
    pub max_steps: usize,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            extension_offset: constants::SYNC_EXTENSION_OFFSET,
            max_steps: constants::SYNC_MAX_STEPS,
        }
    }
}

/// The configuration of the [`crate::WindowBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Seconds before the L1 timestamp an L2 block stays in scope.
    pub lookback: u64,
    /// Seconds after the L1 timestamp an L2 block is in scope.
    pub lookahead: u64,
    /// The maximum number of blocks collected by a single walk.
    pub max_walk: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lookback: constants::WINDOW_LOOKBACK_SECS,
            lookahead: constants::WINDOW_LOOKAHEAD_SECS,
            max_walk: constants::WINDOW_MAX_WALK,
        }
    }
}

/// A token bridged from L1 to L2, whose L1 collateral must cover its L2 supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// The token symbol.
    pub symbol: String,
    /// The token on L1.
    pub l1_token: Address,
    /// The representation of the token on L2.
    pub l2_token: Address,
    /// The token decimals.
    pub decimals: u8,
}

impl TokenPair {
    /// Returns a new [`TokenPair`].
    pub fn new(
        symbol: impl Into<String>,
        l1_token: Address,
        l2_token: Address,
        decimals: u8,
    ) -> Self {
        Self { symbol: symbol.into(), l1_token, l2_token, decimals }
    }
}

/// The configuration of a [`crate::WithdrawalMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalConfig {
    /// The tracked token.
    pub token: TokenPair,
    /// The rolling window the volume is summed over.
    pub window: Duration,
    /// The volume threshold, in whole tokens.
    pub threshold_tokens: u64,
    /// Alerts are raised only at L2 block numbers multiple of this value.
    pub alert_modulus: u64,
    /// The L2 block time assumed when a timestamp cannot be read.
    pub block_time: u64,
}

impl WithdrawalConfig {
    /// Returns the default withdrawal configuration for the token.
    pub const fn new(token: TokenPair) -> Self {
        Self {
            token,
            window: constants::WITHDRAWAL_WINDOW,
            threshold_tokens: constants::WITHDRAWAL_THRESHOLD_TOKENS,
            alert_modulus: constants::WITHDRAWAL_ALERT_MODULUS,
            block_time: constants::L2_BLOCK_TIME_SECS,
        }
    }

    /// Returns the threshold in the token's base units.
    pub fn threshold(&self) -> U256 {
        U256::from(self.threshold_tokens) * U256::from(10).pow(U256::from(self.token.decimals))
    }
}

/// A proxy whose EIP-1967 slots are polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedProxy {
    /// A human readable name.
    pub name: String,
    /// The proxy address.
    pub address: Address,
}

impl WatchedProxy {
    /// Returns a new [`WatchedProxy`].
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self { name: name.into(), address }
    }
}

/// The configuration of the [`crate::ProxyWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// The polled proxies.
    pub proxies: Vec<WatchedProxy>,
    /// Proxies are polled at L2 block numbers multiple of this value.
    pub poll_interval: u64,
}

/// The configuration of the [`crate::HealthChecker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthConfig {
    /// The number of network errors that trips the checker.
    pub error_ceiling: usize,
    /// The time border of an error window.
    pub window: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { error_ceiling: constants::HEALTH_ERROR_CEILING, window: constants::HEALTH_WINDOW }
    }
}

/// The complete configuration of the bridge monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// The chain id of the L2.
    pub l2_chain_id: u64,
    /// The L1 bridge contract escrowing the collateral.
    pub l1_bridge: Address,
    /// The L2 bridge contract emitting withdrawals.
    pub l2_bridge: Address,
    /// The bridged tokens whose collateral is checked.
    pub tokens: Vec<TokenPair>,
    /// The withdrawal volume monitors.
    pub withdrawals: Vec<WithdrawalConfig>,
    /// The polled L2 proxies.
    pub proxy: ProxyConfig,
    /// The L1 contracts whose events are watched.
    pub l1_event_contracts: Vec<Address>,
    /// The L2 contracts whose events are watched.
    pub l2_event_contracts: Vec<Address>,
    /// The synchronizer configuration.
    pub sync: SynchronizerConfig,
    /// The window configuration.
    pub window: WindowConfig,
    /// The health checker configuration.
    pub health: HealthConfig,
    /// The pagination of the withdrawal backfill.
    pub pagination: LogPagination,
    /// The number of dispatched L2 blocks remembered.
    pub dispatched_capacity: NonZeroUsize,
}

/// OP Mainnet chain id.
pub const OP_MAINNET_CHAIN_ID: u64 = 10;

impl MonitorConfig {
    /// Returns the preset configuration for the L2 chain id.
    pub fn for_chain(chain_id: u64) -> Result<Self, ConfigError> {
        match chain_id {
            OP_MAINNET_CHAIN_ID => Ok(Self::op_mainnet()),
            _ => Err(ConfigError::UnsupportedChain(chain_id)),
        }
    }

    /// Returns an empty configuration for the bridge pair, with default settings.
    pub fn new(l2_chain_id: u64, l1_bridge: Address, l2_bridge: Address) -> Self {
        Self {
            l2_chain_id,
            l1_bridge,
            l2_bridge,
            tokens: Vec::new(),
            withdrawals: Vec::new(),
            proxy: ProxyConfig {
                proxies: Vec::new(),
                poll_interval: constants::PROXY_POLL_INTERVAL,
            },
            l1_event_contracts: Vec::new(),
            l2_event_contracts: Vec::new(),
            sync: SynchronizerConfig::default(),
            window: WindowConfig::default(),
            health: HealthConfig::default(),
            pagination: LogPagination::default(),
            dispatched_capacity: constants::DISPATCHED_BLOCKS_CAPACITY,
        }
    }

    fn op_mainnet() -> Self {
        let l1_bridge = address!("0x99C9fc46f92E8a1c0deC1b1747d010903E884bE1");
        let l2_bridge = address!("0x4200000000000000000000000000000000000010");
        let usdt = TokenPair::new(
            "USDT",
            address!("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
            address!("0x94b008aA00579c1307B0EF2c499aD98a8ce58e58"),
            6,
        );
        let wbtc = TokenPair::new(
            "WBTC",
            address!("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
            address!("0x68f180fcCe6836688e9084f035309E29Bf0A2095"),
            8,
        );
        let messenger = address!("0x4200000000000000000000000000000000000007");
        let message_passer = address!("0x4200000000000000000000000000000000000016");

        let mut config = Self::new(OP_MAINNET_CHAIN_ID, l1_bridge, l2_bridge);
        config.withdrawals = vec![WithdrawalConfig::new(usdt.clone())];
        config.tokens = vec![usdt, wbtc];
        config.proxy.proxies = vec![
            WatchedProxy::new("L2StandardBridge", l2_bridge),
            WatchedProxy::new("L2CrossDomainMessenger", messenger),
            WatchedProxy::new("L2ToL1MessagePasser", message_passer),
        ];
        config.l1_event_contracts =
            vec![l1_bridge, address!("0xbEb5Fc579115071764c7423A4f12eDde41f106Ed")];
        config.l2_event_contracts = vec![l2_bridge, messenger, message_passer];
        config
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for withdrawal in &self.withdrawals {
            if withdrawal.threshold_tokens == 0 || withdrawal.alert_modulus == 0 {
                return Err(ConfigError::InvalidThreshold(withdrawal.token.symbol.clone()));
            }
        }
        if self.proxy.poll_interval == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.health.error_ceiling == 0 {
            return Err(ConfigError::InvalidHealthCeiling);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_mainnet_preset_is_valid() {
        let config = MonitorConfig::for_chain(10).unwrap();
        config.validate().unwrap();
        assert_eq!(config.tokens.len(), 2);
        assert_eq!(config.window.lookback, 768);
        assert_eq!(config.window.lookahead, 60);
        assert_eq!(config.proxy.poll_interval, 25);
    }

    #[test]
    fn test_unsupported_chain_is_rejected() {
        assert!(matches!(MonitorConfig::for_chain(1), Err(ConfigError::UnsupportedChain(1))));
    }

    #[test]
    fn test_withdrawal_threshold_in_base_units() {
        let token = TokenPair::new("USDT", Address::ZERO, Address::ZERO, 6);
        assert_eq!(WithdrawalConfig::new(token).threshold(), U256::from(10_000_000_000u64));
    }

    #[test]
    fn test_zero_threshold_is_invalid() {
        let mut config = MonitorConfig::new(10, Address::ZERO, Address::ZERO);
        let mut withdrawal =
            WithdrawalConfig::new(TokenPair::new("USDT", Address::ZERO, Address::ZERO, 6));
        withdrawal.threshold_tokens = 0;
        config.withdrawals.push(withdrawal);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold(_))));
    }
}
