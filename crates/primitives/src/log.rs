use alloy_primitives::{Address, Log, B256};

/// A log emitted by a transaction, with its inclusion metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The consensus log: address, topics and data.
    pub inner: Log,
    /// The hash of the block including the log.
    pub block_hash: Option<B256>,
    /// The number of the block including the log.
    pub block_number: Option<u64>,
    /// The timestamp of the block including the log, if returned by the node.
    pub block_timestamp: Option<u64>,
    /// The hash of the transaction emitting the log.
    pub tx_hash: Option<B256>,
    /// The index of the transaction in the block.
    pub tx_index: Option<u64>,
    /// The index of the log in the block.
    pub log_index: Option<u64>,
    /// Whether the log was removed by a reorg.
    pub removed: bool,
}

impl LogEntry {
    /// The address of the contract emitting the log.
    pub const fn address(&self) -> Address {
        self.inner.address
    }

    /// The log topics.
    pub fn topics(&self) -> &[B256] {
        self.inner.data.topics()
    }

    /// The first topic of the log, which is the event signature for non-anonymous events.
    pub fn signature(&self) -> Option<B256> {
        self.topics().first().copied()
    }
}

impl From<alloy_rpc_types_eth::Log> for LogEntry {
    fn from(value: alloy_rpc_types_eth::Log) -> Self {
        Self {
            inner: value.inner,
            block_hash: value.block_hash,
            block_number: value.block_number,
            block_timestamp: value.block_timestamp,
            tx_hash: value.transaction_hash,
            tx_index: value.transaction_index,
            log_index: value.log_index,
            removed: value.removed,
        }
    }
}
