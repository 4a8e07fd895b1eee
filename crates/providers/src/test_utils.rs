//! Test utils for providers.

use crate::{ChainClient, LogQuery, RpcMethod};
use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, Bytes, Log, LogData, B256, U256};
use alloy_sol_types::SolValue;
use alloy_transport::{TransportErrorKind, TransportResult};
use bridge_monitor_abi::{calls::Erc20Call, slots};
use bridge_monitor_primitives::{ChainBlock, ChainBlockWithTxs, LogEntry, TxRecord};
use parking_lot::Mutex;
use rand::Rng;

/// Returns a chain of blocks numbered from 0 with the provided timestamps. Hashes are derived
/// from the seed and the block number, so chains built from different seeds never collide.
pub fn chain_from_timestamps(seed: u8, timestamps: &[u64]) -> Vec<ChainBlock> {
    let mut parent_hash = B256::ZERO;
    timestamps
        .iter()
        .enumerate()
        .map(|(number, timestamp)| {
            let mut preimage = [0u8; 9];
            preimage[0] = seed;
            preimage[1..].copy_from_slice(&(number as u64).to_be_bytes());
            let block =
                ChainBlock::new(keccak256(preimage), parent_hash, number as u64, *timestamp);
            parent_hash = block.hash;
            block
        })
        .collect()
}

/// Returns `count` non decreasing timestamps starting at `start`, with gaps drawn uniformly
/// from `[block_time - drift, block_time + drift]`.
pub fn drifting_timestamps<R: Rng>(
    rng: &mut R,
    start: u64,
    count: usize,
    block_time: u64,
    drift: u64,
) -> Vec<u64> {
    let mut timestamp = start;
    (0..count)
        .map(|i| {
            if i > 0 {
                timestamp +=
                    rng.random_range(block_time.saturating_sub(drift)..=block_time + drift);
            }
            timestamp
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    Times(usize),
    Panic,
}

#[derive(Debug, Default)]
struct MockState {
    blocks: Vec<ChainBlock>,
    by_hash: HashMap<B256, usize>,
    tip: Option<u64>,
    transactions: HashMap<B256, Vec<TxRecord>>,
    logs: Vec<LogEntry>,
    balances: HashMap<(Address, Address), U256>,
    supplies: HashMap<Address, U256>,
    storage: HashMap<(Address, U256), U256>,
    failures: HashMap<RpcMethod, Failure>,
    calls: HashMap<RpcMethod, usize>,
}

impl MockState {
    /// Counts the call and returns an error if a failure is injected for the method.
    fn enter(&mut self, method: RpcMethod) -> TransportResult<()> {
        *self.calls.entry(method).or_default() += 1;
        match self.failures.get(&method).copied() {
            Some(Failure::Always) => Err(TransportErrorKind::custom_str("mock failure")),
            Some(Failure::Panic) => panic!("mock client panicked on {}", method.as_str()),
            Some(Failure::Times(n)) if n > 0 => {
                self.failures.insert(method, Failure::Times(n - 1));
                Err(TransportErrorKind::custom_str("mock failure"))
            }
            _ => Ok(()),
        }
    }

    fn block(&self, hash: &B256) -> Option<ChainBlock> {
        self.by_hash.get(hash).map(|index| self.blocks[*index])
    }
}

/// An in-memory [`ChainClient`] with injectable failures and per-method call counters.
#[derive(Debug, Default)]
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl MockChainClient {
    /// Returns a new mock serving the provided blocks, the last one being the tip.
    pub fn new(blocks: Vec<ChainBlock>) -> Self {
        let mock = Self::default();
        for block in blocks {
            mock.push_block(block);
        }
        mock
    }

    /// Appends a block to the chain.
    pub fn push_block(&self, block: ChainBlock) {
        let mut state = self.state.lock();
        let index = state.blocks.len();
        state.by_hash.insert(block.hash, index);
        state.blocks.push(block);
    }

    /// Sets the block number reported as the chain tip.
    pub fn set_tip(&self, number: u64) {
        self.state.lock().tip = Some(number);
    }

    /// Reports the last block as the chain tip again.
    pub fn clear_tip(&self) {
        self.state.lock().tip = None;
    }

    /// Sets the transactions of the block.
    pub fn set_transactions(&self, hash: B256, transactions: Vec<TxRecord>) {
        self.state.lock().transactions.insert(hash, transactions);
    }

    /// Adds a log served by log queries.
    pub fn push_log(&self, log: LogEntry) {
        self.state.lock().logs.push(log);
    }

    /// Sets the token balance of the holder, at every block.
    pub fn set_balance(&self, token: Address, holder: Address, balance: U256) {
        self.state.lock().balances.insert((token, holder), balance);
    }

    /// Sets the total supply of the token, at every block.
    pub fn set_total_supply(&self, token: Address, supply: U256) {
        self.state.lock().supplies.insert(token, supply);
    }

    /// Sets the EIP-1967 implementation of the proxy.
    pub fn set_implementation(&self, proxy: Address, implementation: Address) {
        let slot = U256::from_be_bytes(slots::IMPLEMENTATION.0);
        let value = U256::from_be_bytes(implementation.into_word().0);
        self.state.lock().storage.insert((proxy, slot), value);
    }

    /// Sets the EIP-1967 admin of the proxy.
    pub fn set_admin(&self, proxy: Address, admin: Address) {
        let slot = U256::from_be_bytes(slots::ADMIN.0);
        let value = U256::from_be_bytes(admin.into_word().0);
        self.state.lock().storage.insert((proxy, slot), value);
    }

    /// Makes every call to the method fail.
    pub fn fail_always(&self, method: RpcMethod) {
        self.state.lock().failures.insert(method, Failure::Always);
    }

    /// Makes the next `n` calls to the method fail.
    pub fn fail_times(&self, method: RpcMethod, n: usize) {
        self.state.lock().failures.insert(method, Failure::Times(n));
    }

    /// Makes every call to the method panic.
    pub fn panic_on(&self, method: RpcMethod) {
        self.state.lock().failures.insert(method, Failure::Panic);
    }

    /// Removes any injected failure for the method.
    pub fn recover(&self, method: RpcMethod) {
        self.state.lock().failures.remove(&method);
    }

    /// Returns the number of calls made to the method, failed ones included.
    pub fn calls(&self, method: RpcMethod) -> usize {
        self.state.lock().calls.get(&method).copied().unwrap_or_default()
    }

    /// Returns a data-less log emitted by `address` in the block, with the provided signature.
    pub fn log_at(block: &ChainBlock, address: Address, signature: B256) -> LogEntry {
        Self::log_with_data(block, LogData::new_unchecked(vec![signature], Bytes::new()), address)
    }

    /// Returns a log emitted by `address` in the block with the provided data.
    pub fn log_with_data(block: &ChainBlock, data: LogData, address: Address) -> LogEntry {
        LogEntry {
            inner: Log { address, data },
            block_hash: Some(block.hash),
            block_number: Some(block.number),
            block_timestamp: Some(block.timestamp),
            tx_hash: Some(keccak256(block.hash)),
            tx_index: Some(0),
            log_index: Some(0),
            removed: false,
        }
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChainClient {
    async fn block_by_number(&self, number: u64) -> TransportResult<Option<ChainBlock>> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::BlockByNumber)?;
        Ok(state.blocks.get(number as usize).copied())
    }

    async fn block_by_hash(&self, hash: B256) -> TransportResult<Option<ChainBlock>> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::BlockByHash)?;
        Ok(state.block(&hash))
    }

    async fn latest_block(&self) -> TransportResult<Option<ChainBlock>> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::LatestBlock)?;
        Ok(match state.tip {
            Some(number) => state.blocks.get(number as usize).copied(),
            None => state.blocks.last().copied(),
        })
    }

    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> TransportResult<Option<ChainBlockWithTxs>> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::BlockWithTransactions)?;
        Ok(state.block(&hash).map(|block| ChainBlockWithTxs {
            block,
            transactions: state.transactions.get(&hash).cloned().unwrap_or_default(),
        }))
    }

    async fn logs(&self, query: &LogQuery) -> TransportResult<Vec<LogEntry>> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::Logs)?;
        Ok(state.logs.iter().filter(|log| query.matches(log)).cloned().collect())
    }

    async fn call(&self, to: Address, input: Bytes, _block_hash: B256) -> TransportResult<Bytes> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::Call)?;
        let value = match Erc20Call::try_decode(&input) {
            Some(Erc20Call::BalanceOf(call)) => {
                state.balances.get(&(to, call.account)).copied().unwrap_or_default()
            }
            Some(Erc20Call::TotalSupply(_)) => state.supplies.get(&to).copied().unwrap_or_default(),
            None => return Err(TransportErrorKind::custom_str("execution reverted")),
        };
        Ok(value.abi_encode().into())
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: U256,
        _block_hash: B256,
    ) -> TransportResult<U256> {
        let mut state = self.state.lock();
        state.enter(RpcMethod::StorageAt)?;
        Ok(state.storage.get(&(address, slot)).copied().unwrap_or_default())
    }
}
