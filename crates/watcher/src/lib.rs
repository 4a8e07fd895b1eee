//! Bridge monitor checks: maps each L1 block to the L2 blocks it covers and runs the collateral,
//! withdrawal volume, proxy and event checks over them in a background worker.

pub use agent::BridgeAgent;
mod agent;

pub use balance::{BalanceChecker, BALANCE_ALERT_ID};
mod balance;

pub use buffer::FindingsBuffer;
mod buffer;

pub use config::{
    HealthConfig, MonitorConfig, ProxyConfig, SynchronizerConfig, TokenPair, WatchedProxy,
    WindowConfig, WithdrawalConfig, OP_MAINNET_CHAIN_ID,
};
mod config;

pub mod constants;

pub use error::{AgentError, ConfigError, SyncError, WindowError};
mod error;

pub use events::EventWatcher;
mod events;

pub use handle::{MonitorCommand, MonitorHandle};
mod handle;

pub use health::{HealthChecker, HealthStatus};
mod health;

pub use metrics::{MonitorMetrics, SynchronizerMetrics};
mod metrics;

pub use processor::{BridgeProcessor, L2_BLOCK_ALERT_ID, WINDOW_ALERT_ID};
mod processor;

pub use proxy::{ProxyState, ProxyWatcher, PROXY_ALERT_ID};
mod proxy;

pub use sync::{Direction, L2Synchronizer};
mod sync;

pub use window::{BlockWindow, WindowBuilder};
mod window;

pub use withdrawal::{WithdrawalMonitor, WITHDRAWAL_ALERT_ID};
mod withdrawal;

pub use worker::{MonitorWorker, WORKER_ALERT_ID};
mod worker;

#[cfg(any(test, feature = "test-utils"))]
/// Common test helpers
pub mod test_utils;
