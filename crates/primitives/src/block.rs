use crate::LogEntry;

use alloy_primitives::{Address, B256};

/// The header fields of a block on either chain that the monitor relies on.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("#{number} ({hash}) @ {timestamp}")]
pub struct ChainBlock {
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The block number.
    pub number: u64,
    /// The block timestamp, in unix seconds.
    pub timestamp: u64,
}

impl ChainBlock {
    /// Returns a new instance of [`ChainBlock`].
    pub const fn new(hash: B256, parent_hash: B256, number: u64, timestamp: u64) -> Self {
        Self { hash, parent_hash, number, timestamp }
    }

    /// Returns true if `self` is the direct parent of `child`.
    pub fn is_parent_of(&self, child: &Self) -> bool {
        self.hash == child.parent_hash && self.number + 1 == child.number
    }
}

impl From<&alloy_rpc_types_eth::Header> for ChainBlock {
    fn from(value: &alloy_rpc_types_eth::Header) -> Self {
        Self {
            hash: value.hash,
            parent_hash: value.parent_hash,
            number: value.number,
            timestamp: value.timestamp,
        }
    }
}

/// A transaction observed in a block, along with the logs it emitted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TxRecord {
    /// The transaction hash.
    pub hash: B256,
    /// The recipient of the transaction, `None` for contract creations.
    pub to: Option<Address>,
    /// The logs emitted by the transaction, in log index order.
    pub logs: Vec<LogEntry>,
    /// The number of the block including the transaction.
    pub block_number: u64,
    /// The timestamp of the block including the transaction.
    pub block_timestamp: u64,
}

/// A [`ChainBlock`] along with its ordered transactions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainBlockWithTxs {
    /// The block header.
    pub block: ChainBlock,
    /// The transactions in the block, in original order.
    pub transactions: Vec<TxRecord>,
}

impl ChainBlockWithTxs {
    /// Returns a new [`ChainBlockWithTxs`] without any transactions.
    pub const fn empty(block: ChainBlock) -> Self {
        Self { block, transactions: Vec::new() }
    }
}
