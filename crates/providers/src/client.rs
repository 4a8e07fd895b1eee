use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::Filter;
use alloy_transport::TransportResult;
use bridge_monitor_primitives::{ChainBlock, ChainBlockWithTxs, LogEntry};

/// A log query over an inclusive block range.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// The emitting contracts. Empty matches any contract.
    pub addresses: Vec<Address>,
    /// The accepted event signatures. Empty matches any event.
    pub topics: Vec<B256>,
    /// The first block of the range.
    pub from_block: u64,
    /// The last block of the range.
    pub to_block: u64,
}

impl LogQuery {
    /// Returns a new [`LogQuery`] over `[from_block, to_block]`.
    pub const fn new(
        addresses: Vec<Address>,
        topics: Vec<B256>,
        from_block: u64,
        to_block: u64,
    ) -> Self {
        Self { addresses, topics, from_block, to_block }
    }

    /// Returns a copy of the query restricted to `[from_block, to_block]`.
    pub fn with_range(&self, from_block: u64, to_block: u64) -> Self {
        Self {
            addresses: self.addresses.clone(),
            topics: self.topics.clone(),
            from_block,
            to_block,
        }
    }

    /// Returns true if the log matches the query's addresses, topics and range.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let in_range = entry
            .block_number
            .is_some_and(|number| self.from_block <= number && number <= self.to_block);
        let address = self.addresses.is_empty() || self.addresses.contains(&entry.address());
        let topic = self.topics.is_empty() ||
            entry.signature().is_some_and(|signature| self.topics.contains(&signature));
        in_range && address && topic
    }
}

impl From<&LogQuery> for Filter {
    fn from(query: &LogQuery) -> Self {
        let mut filter = Self::new().from_block(query.from_block).to_block(query.to_block);
        if !query.addresses.is_empty() {
            filter = filter.address(query.addresses.clone());
        }
        if !query.topics.is_empty() {
            filter = filter.event_signature(query.topics.clone());
        }
        filter
    }
}

/// The raw chain reads the monitor depends on.
///
/// Implementations surface failures as transport errors and missing data as `None`, without
/// retrying. Retries and caching are layered on top by [`crate::RetryingClient`].
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait ChainClient: Send + Sync {
    /// Returns the block at the provided number.
    async fn block_by_number(&self, number: u64) -> TransportResult<Option<ChainBlock>>;

    /// Returns the block with the provided hash.
    async fn block_by_hash(&self, hash: B256) -> TransportResult<Option<ChainBlock>>;

    /// Returns the latest block of the chain.
    async fn latest_block(&self) -> TransportResult<Option<ChainBlock>>;

    /// Returns the block with the provided hash along with its transactions and their logs.
    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> TransportResult<Option<ChainBlockWithTxs>>;

    /// Returns the logs matching the query.
    async fn logs(&self, query: &LogQuery) -> TransportResult<Vec<LogEntry>>;

    /// Executes a read only call against the state at the provided block.
    async fn call(&self, to: Address, input: Bytes, block_hash: B256) -> TransportResult<Bytes>;

    /// Returns the storage value at the slot for the state at the provided block.
    async fn storage_at(&self, address: Address, slot: U256, block_hash: B256)
        -> TransportResult<U256>;
}
