use crate::{
    metrics::RpcMetricsHandler, CacheConfig, CallFailure, ChainClient, LogQuery, NetworkError,
    Retry, RpcMethod, TtlCache,
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use alloy_transport::TransportResult;
use bridge_monitor_abi::{calls::Erc20Call, slots};
use bridge_monitor_primitives::{ChainBlock, ChainBlockWithTxs, LogEntry};
use futures::StreamExt;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

/// The default number of blocks covered by a single log query.
const DEFAULT_LOG_BATCH_SIZE: u64 = 5_000;

/// The default number of log queries in flight.
const DEFAULT_LOG_CONCURRENCY: usize = 4;

/// The default delay before each log query.
const DEFAULT_LOG_BATCH_DELAY: Duration = Duration::from_millis(100);

/// The default number of extra rounds a failed log batch is re-queued for.
const DEFAULT_LOG_EXTRA_ATTEMPTS: usize = 2;

/// How a log query over a large block range is split and scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPagination {
    /// The number of blocks covered by a single query.
    pub batch_size: u64,
    /// The number of queries in flight.
    pub concurrency: usize,
    /// The delay before each query.
    pub batch_delay: Duration,
    /// The number of extra rounds a failed batch is re-queued for before being dropped.
    pub extra_attempts: usize,
}

impl Default for LogPagination {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_LOG_BATCH_SIZE,
            concurrency: DEFAULT_LOG_CONCURRENCY,
            batch_delay: DEFAULT_LOG_BATCH_DELAY,
            extra_attempts: DEFAULT_LOG_EXTRA_ATTEMPTS,
        }
    }
}

impl LogPagination {
    /// Splits `[from, to]` into inclusive ranges of at most `batch_size` blocks.
    fn ranges(&self, from: u64, to: u64) -> Vec<(u64, u64)> {
        let size = self.batch_size.max(1);
        let mut ranges = Vec::new();
        let mut start = from;
        while start <= to {
            let end = start.saturating_add(size - 1).min(to);
            ranges.push((start, end));
            if end == u64::MAX {
                break;
            }
            start = end + 1;
        }
        ranges
    }
}

/// The key of a cached contract read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ReadKey {
    Balance { token: Address, holder: Address, block: B256 },
    Supply { token: Address, block: B256 },
}

/// A [`ChainClient`] wrapper that retries every read with a fixed [`Retry`] policy, converts
/// exhausted reads into [`NetworkError`]s, caches immutable results and records metrics.
#[derive(Debug)]
pub struct RetryingClient<C> {
    inner: C,
    chain: &'static str,
    retry: Retry,
    latest_ttl: Duration,
    reads: Mutex<TtlCache<ReadKey, U256>>,
    headers: Mutex<LruCache<B256, ChainBlock>>,
    blocks: Mutex<LruCache<B256, Arc<ChainBlockWithTxs>>>,
    latest: Mutex<Option<(Instant, ChainBlock)>>,
    metrics: RpcMetricsHandler,
}

impl<C: ChainClient> RetryingClient<C> {
    /// Returns a new [`RetryingClient`] for the chain with the provided name.
    pub fn new(inner: C, chain: &'static str, retry: Retry, cache: CacheConfig) -> Self {
        Self {
            inner,
            chain,
            retry,
            latest_ttl: cache.latest_ttl,
            reads: Mutex::new(TtlCache::new(cache.read_capacity, cache.read_ttl)),
            headers: Mutex::new(LruCache::new(cache.block_capacity)),
            blocks: Mutex::new(LruCache::new(cache.block_capacity)),
            latest: Mutex::new(None),
            metrics: RpcMetricsHandler::new(chain),
        }
    }

    /// Returns a reference to the inner client.
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns the name of the chain served by the client.
    pub const fn chain(&self) -> &'static str {
        self.chain
    }

    /// Runs the operation under the retry policy. A `None` result counts as a failed attempt.
    async fn request<T, F, Fut>(&self, method: RpcMethod, operation: F) -> Result<T, NetworkError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = TransportResult<Option<T>>>,
    {
        let start = Instant::now();
        let attempts = AtomicUsize::new(0);
        let result = self
            .retry
            .retry(method.as_str(), || {
                attempts.fetch_add(1, Ordering::Relaxed);
                let call = operation();
                async move {
                    match call.await {
                        Ok(Some(value)) => Ok(value),
                        Ok(None) => Err(CallFailure::NullResponse),
                        Err(err) => Err(CallFailure::Transport(err)),
                    }
                }
            })
            .await;

        let attempts = attempts.into_inner();
        self.metrics.record(method, result.is_ok(), attempts, start.elapsed());
        result.map_err(|source| {
            tracing::warn!(target: "bridge::providers", chain = self.chain, %method, attempts, err = %source, "chain read failed");
            NetworkError::new(method, source)
        })
    }

    fn cache_header(&self, block: ChainBlock) {
        self.headers.lock().put(block.hash, block);
    }

    /// Returns the block at the provided number.
    pub async fn block_by_number(&self, number: u64) -> Result<ChainBlock, NetworkError> {
        let inner = &self.inner;
        let block =
            self.request(RpcMethod::BlockByNumber, || inner.block_by_number(number)).await?;
        self.cache_header(block);
        Ok(block)
    }

    /// Returns the block with the provided hash, served from cache when possible.
    pub async fn block_by_hash(&self, hash: B256) -> Result<ChainBlock, NetworkError> {
        let cached = self.headers.lock().get(&hash).copied();
        if let Some(block) = cached {
            return Ok(block);
        }
        let inner = &self.inner;
        let block = self.request(RpcMethod::BlockByHash, || inner.block_by_hash(hash)).await?;
        self.cache_header(block);
        Ok(block)
    }

    /// Returns the chain tip, cached for a short time to live.
    pub async fn latest_block(&self) -> Result<ChainBlock, NetworkError> {
        let cached = *self.latest.lock();
        if let Some((fetched_at, block)) = cached {
            if fetched_at.elapsed() <= self.latest_ttl {
                return Ok(block);
            }
        }
        let inner = &self.inner;
        let block = self.request(RpcMethod::LatestBlock, || inner.latest_block()).await?;
        *self.latest.lock() = Some((Instant::now(), block));
        self.cache_header(block);
        Ok(block)
    }

    /// Returns the block with its transactions, cached by hash.
    pub async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> Result<Arc<ChainBlockWithTxs>, NetworkError> {
        let cached = self.blocks.lock().get(&hash).cloned();
        if let Some(block) = cached {
            return Ok(block);
        }
        let inner = &self.inner;
        let block = Arc::new(
            self.request(RpcMethod::BlockWithTransactions, || inner.block_with_transactions(hash))
                .await?,
        );
        self.cache_header(block.block);
        self.blocks.lock().put(hash, block.clone());
        Ok(block)
    }

    /// Returns the logs matching the query in a single request.
    pub async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, NetworkError> {
        let inner = &self.inner;
        self.request(RpcMethod::Logs, || async move { inner.logs(query).await.map(Some) }).await
    }

    /// Returns the logs matching the query, split into batches executed with bounded
    /// concurrency. A batch failing every round is dropped with a warning. The logs are
    /// returned in chain order.
    pub async fn logs_paginated(
        &self,
        query: &LogQuery,
        pagination: &LogPagination,
    ) -> Vec<LogEntry> {
        let mut pending = pagination.ranges(query.from_block, query.to_block);
        let mut logs = Vec::new();

        for round in 0..=pagination.extra_attempts {
            if pending.is_empty() {
                break;
            }
            if round > 0 {
                tracing::debug!(target: "bridge::providers", chain = self.chain, round, batches = pending.len(), "re-queueing failed log batches");
            }

            let results: Vec<_> = futures::stream::iter(pending.drain(..))
                .map(|(from, to)| async move {
                    tokio::time::sleep(pagination.batch_delay).await;
                    ((from, to), self.logs(&query.with_range(from, to)).await)
                })
                .buffer_unordered(pagination.concurrency.max(1))
                .collect()
                .await;

            for (range, result) in results {
                match result {
                    Ok(batch) => logs.extend(batch),
                    Err(_) => pending.push(range),
                }
            }
        }

        for (from, to) in pending {
            tracing::warn!(target: "bridge::providers", chain = self.chain, from, to, "dropping log batch after exhausting attempts");
        }

        logs.sort_by_key(|log| (log.block_number, log.tx_index, log.log_index));
        logs
    }

    /// Executes a read only call against the state at the provided block.
    pub async fn call(
        &self,
        to: Address,
        input: Bytes,
        block_hash: B256,
    ) -> Result<Bytes, NetworkError> {
        let inner = &self.inner;
        self.request(RpcMethod::Call, || {
            let input = input.clone();
            async move { inner.call(to, input, block_hash).await.map(Some) }
        })
        .await
    }

    /// Returns the raw storage value of the slot at the provided block.
    pub async fn storage_at(
        &self,
        address: Address,
        slot: U256,
        block_hash: B256,
    ) -> Result<U256, NetworkError> {
        let inner = &self.inner;
        self.request(RpcMethod::StorageAt, || async move {
            inner.storage_at(address, slot, block_hash).await.map(Some)
        })
        .await
    }

    async fn cached_read(
        &self,
        key: ReadKey,
        to: Address,
        input: Bytes,
        block_hash: B256,
    ) -> Result<U256, NetworkError> {
        let cached = self.reads.lock().get(&key);
        if let Some(value) = cached {
            return Ok(value);
        }
        let output = self.call(to, input, block_hash).await?;
        let value = U256::abi_decode(&output).map_err(|err| {
            NetworkError::new(RpcMethod::Call, CallFailure::InvalidResponse(err.to_string()))
        })?;
        self.reads.lock().insert(key, value);
        Ok(value)
    }

    /// Returns the ERC-20 balance of the holder at the provided block, memoized per block hash.
    pub async fn erc20_balance(
        &self,
        token: Address,
        holder: Address,
        block_hash: B256,
    ) -> Result<U256, NetworkError> {
        let key = ReadKey::Balance { token, holder, block: block_hash };
        self.cached_read(key, token, Erc20Call::balance_of(holder), block_hash).await
    }

    /// Returns the ERC-20 total supply at the provided block, memoized per block hash.
    pub async fn erc20_total_supply(
        &self,
        token: Address,
        block_hash: B256,
    ) -> Result<U256, NetworkError> {
        let key = ReadKey::Supply { token, block: block_hash };
        self.cached_read(key, token, Erc20Call::total_supply(), block_hash).await
    }

    /// Returns the EIP-1967 implementation of the proxy at the provided block.
    pub async fn proxy_implementation(
        &self,
        proxy: Address,
        block_hash: B256,
    ) -> Result<Address, NetworkError> {
        let value =
            self.storage_at(proxy, U256::from_be_bytes(slots::IMPLEMENTATION.0), block_hash).await?;
        Ok(Address::from_slice(&value.to_be_bytes::<32>()[12..]))
    }

    /// Returns the EIP-1967 admin of the proxy at the provided block.
    pub async fn proxy_admin(
        &self,
        proxy: Address,
        block_hash: B256,
    ) -> Result<Address, NetworkError> {
        let value = self.storage_at(proxy, U256::from_be_bytes(slots::ADMIN.0), block_hash).await?;
        Ok(Address::from_slice(&value.to_be_bytes::<32>()[12..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chain_from_timestamps, MockChainClient};
    use alloy_primitives::address;

    fn client(mock: MockChainClient) -> RetryingClient<MockChainClient> {
        RetryingClient::new(mock, "l2", Retry::default(), CacheConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_network_error() -> eyre::Result<()> {
        // Given
        let mock = MockChainClient::new(chain_from_timestamps(1, &[0, 2, 4]));
        mock.fail_always(RpcMethod::BlockByNumber);
        let client = client(mock);

        // When
        let start = Instant::now();
        let err = client.block_by_number(1).await.unwrap_err();

        // Then
        assert_eq!(err.method, RpcMethod::BlockByNumber);
        assert!(err.to_string().starts_with("could not call eth_getBlockByNumber"));
        assert_eq!(client.inner().calls(RpcMethod::BlockByNumber), 5);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2_000) && elapsed < Duration::from_millis(2_100));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_block_is_retried_as_null_response() -> eyre::Result<()> {
        let client = client(MockChainClient::new(chain_from_timestamps(1, &[0, 2])));

        let err = client.block_by_number(10).await.unwrap_err();

        assert!(matches!(err.source, CallFailure::NullResponse));
        assert_eq!(client.inner().calls(RpcMethod::BlockByNumber), 5);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_recovers() -> eyre::Result<()> {
        let blocks = chain_from_timestamps(1, &[0, 2, 4]);
        let mock = MockChainClient::new(blocks.clone());
        mock.fail_times(RpcMethod::BlockByHash, 3);
        let client = client(mock);

        let block = client.block_by_hash(blocks[2].hash).await?;

        assert_eq!(block, blocks[2]);
        assert_eq!(client.inner().calls(RpcMethod::BlockByHash), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_reads_are_memoized_per_block_hash() -> eyre::Result<()> {
        // Given
        let token = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
        let bridge = address!("0x99C9fc46f92E8a1c0deC1b1747d010903E884bE1");
        let blocks = chain_from_timestamps(1, &[0, 12]);
        let mock = MockChainClient::new(blocks.clone());
        mock.set_balance(token, bridge, U256::from(100));
        mock.set_total_supply(token, U256::from(7));
        let client = client(mock);

        // When
        let first = client.erc20_balance(token, bridge, blocks[1].hash).await?;
        let second = client.erc20_balance(token, bridge, blocks[1].hash).await?;
        let other_block = client.erc20_balance(token, bridge, blocks[0].hash).await?;
        let supply = client.erc20_total_supply(token, blocks[1].hash).await?;

        // Then
        assert_eq!(first, U256::from(100));
        assert_eq!(second, first);
        assert_eq!(other_block, first);
        assert_eq!(supply, U256::from(7));
        assert_eq!(client.inner().calls(RpcMethod::Call), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_blocks_by_hash_are_cached() -> eyre::Result<()> {
        let blocks = chain_from_timestamps(1, &[0, 2, 4]);
        let client = client(MockChainClient::new(blocks.clone()));

        client.block_with_transactions(blocks[1].hash).await?;
        client.block_with_transactions(blocks[1].hash).await?;
        client.block_by_hash(blocks[1].hash).await?;

        assert_eq!(client.inner().calls(RpcMethod::BlockWithTransactions), 1);
        assert_eq!(client.inner().calls(RpcMethod::BlockByHash), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_proxy_slots_are_decoded_as_addresses() -> eyre::Result<()> {
        let proxy = address!("0x4200000000000000000000000000000000000010");
        let implementation = address!("0xC0d3c0d3C0D3c0D3C0d3C0D3C0D3c0d3c0d30010");
        let blocks = chain_from_timestamps(1, &[0]);
        let mock = MockChainClient::new(blocks.clone());
        mock.set_implementation(proxy, implementation);
        let client = client(mock);

        assert_eq!(client.proxy_implementation(proxy, blocks[0].hash).await?, implementation);
        assert_eq!(client.proxy_admin(proxy, blocks[0].hash).await?, Address::ZERO);

        Ok(())
    }

    #[test]
    fn test_pagination_ranges_cover_span() {
        let pagination = LogPagination { batch_size: 5_000, ..Default::default() };
        assert_eq!(
            pagination.ranges(0, 12_000),
            vec![(0, 4_999), (5_000, 9_999), (10_000, 12_000)]
        );
        assert_eq!(pagination.ranges(7, 7), vec![(7, 7)]);
        assert!(pagination.ranges(8, 7).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginated_logs_requeue_failed_batches() -> eyre::Result<()> {
        // Given
        let timestamps: Vec<u64> = (0..12_001).map(|n| n * 2).collect();
        let blocks = chain_from_timestamps(1, &timestamps);
        let mock = MockChainClient::new(blocks.clone());
        let emitter = address!("0x4200000000000000000000000000000000000010");
        for number in [10, 6_000, 11_999] {
            mock.push_log(MockChainClient::log_at(&blocks[number as usize], emitter, B256::ZERO));
        }
        mock.fail_times(RpcMethod::Logs, 5);
        let client = client(mock);
        let query = LogQuery::new(vec![emitter], vec![], 0, 12_000);

        // When
        let logs = client.logs_paginated(&query, &LogPagination::default()).await;

        // Then
        let numbers: Vec<_> = logs.iter().filter_map(|log| log.block_number).collect();
        assert_eq!(numbers, vec![10, 6_000, 11_999]);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_paginated_logs_drop_batches_failing_every_round() -> eyre::Result<()> {
        let blocks = chain_from_timestamps(1, &[0, 2, 4]);
        let mock = MockChainClient::new(blocks);
        mock.fail_always(RpcMethod::Logs);
        let client = client(mock);
        let pagination = LogPagination { batch_size: 2, ..Default::default() };

        let logs = client.logs_paginated(&LogQuery::new(vec![], vec![], 0, 2), &pagination).await;

        assert!(logs.is_empty());
        // 2 batches, 5 attempts each, 3 rounds.
        assert_eq!(client.inner().calls(RpcMethod::Logs), 30);

        Ok(())
    }
}
