use crate::sync::Direction;

use bridge_monitor_providers::NetworkError;

/// An error that occurred while mapping a timestamp to an L2 block.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A block fetch failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The search issued more block fetches than allowed.
    #[error("search for timestamp {target} exhausted after {steps} block fetches")]
    SearchExhausted {
        /// The searched timestamp.
        target: u64,
        /// The number of block fetches issued.
        steps: usize,
    },
    /// No block matches the timestamp in the searched direction.
    #[error("no block at timestamp {target} searching {direction:?}")]
    TargetOutOfRange {
        /// The searched timestamp.
        target: u64,
        /// The search direction.
        direction: Direction,
    },
}

/// An error that occurred while building the window of an L1 block.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The chain tip could not be read.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The anchor block could not be located.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// An invalid monitor configuration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No preset exists for the chain id.
    #[error("unsupported chain id {0}")]
    UnsupportedChain(u64),
    /// A withdrawal threshold or alert modulus is zero.
    #[error("invalid withdrawal threshold for {0}")]
    InvalidThreshold(String),
    /// The proxy poll interval is zero.
    #[error("invalid proxy poll interval")]
    InvalidPollInterval,
    /// The health error ceiling is zero.
    #[error("invalid health error ceiling")]
    InvalidHealthCeiling,
}

/// An error returned by the [`crate::BridgeAgent`].
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A request was served before initialization.
    #[error("agent is not initialized")]
    NotInitialized,
    /// The agent was already initialized.
    #[error("agent is already initialized")]
    AlreadyInitialized,
    /// The background worker stopped.
    #[error("monitor worker shut down")]
    Shutdown,
    /// The L2 chain tip could not be read during initialization.
    #[error(transparent)]
    Network(#[from] NetworkError),
}
