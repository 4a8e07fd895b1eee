//! Chain access for the bridge monitor: the [`ChainClient`] seam, its alloy backed
//! implementation and the [`RetryingClient`] wrapping every read in retries, caches and
//! metrics.

pub use alloy::AlloyChainClient;
mod alloy;

pub use cache::{CacheConfig, TtlCache};
mod cache;

pub use client::{ChainClient, LogQuery};
mod client;

pub use error::{CallFailure, NetworkError};
mod error;

pub use metrics::RpcMethod;
mod metrics;

pub use retry::Retry;
mod retry;

pub use retrying::{LogPagination, RetryingClient};
mod retrying;

#[cfg(any(test, feature = "test-utils"))]
/// Common test helpers
pub mod test_utils;
