use crate::{ChainClient, LogQuery};
use std::{collections::HashMap, future::IntoFuture, marker::PhantomData};

use alloy_consensus::BlockHeader;
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_network::{
    primitives::HeaderResponse, BlockResponse, Ethereum, Network, TransactionBuilder,
    TransactionResponse,
};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::Filter;
use alloy_transport::TransportResult;
use bridge_monitor_primitives::{ChainBlock, ChainBlockWithTxs, LogEntry, TxRecord};

/// A [`ChainClient`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct AlloyChainClient<P, N = Ethereum> {
    provider: P,
    _network: PhantomData<fn() -> N>,
}

impl<P, N> AlloyChainClient<P, N> {
    /// Returns a new [`AlloyChainClient`] over the provider.
    pub const fn new(provider: P) -> Self {
        Self { provider, _network: PhantomData }
    }

    /// Returns a reference to the inner provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

fn to_chain_block<H: HeaderResponse + BlockHeader>(header: &H) -> ChainBlock {
    ChainBlock::new(
        HeaderResponse::hash(header),
        BlockHeader::parent_hash(header),
        BlockHeader::number(header),
        BlockHeader::timestamp(header),
    )
}

#[async_trait::async_trait]
impl<P, N> ChainClient for AlloyChainClient<P, N>
where
    P: Provider<N> + Send + Sync,
    N: Network,
    N::TransactionResponse: alloy_consensus::Transaction,
{
    async fn block_by_number(&self, number: u64) -> TransportResult<Option<ChainBlock>> {
        let block = self.provider.get_block_by_number(BlockNumberOrTag::Number(number)).await?;
        Ok(block.map(|block| to_chain_block(block.header())))
    }

    async fn block_by_hash(&self, hash: B256) -> TransportResult<Option<ChainBlock>> {
        let block = self.provider.get_block_by_hash(hash).await?;
        Ok(block.map(|block| to_chain_block(block.header())))
    }

    async fn latest_block(&self) -> TransportResult<Option<ChainBlock>> {
        let block = self.provider.get_block_by_number(BlockNumberOrTag::Latest).await?;
        Ok(block.map(|block| to_chain_block(block.header())))
    }

    async fn block_with_transactions(
        &self,
        hash: B256,
    ) -> TransportResult<Option<ChainBlockWithTxs>> {
        let filter = Filter::new().at_block_hash(hash);
        let (block, logs) = tokio::try_join!(
            self.provider.get_block_by_hash(hash).full().into_future(),
            self.provider.get_logs(&filter).into_future()
        )?;
        let Some(block) = block else { return Ok(None) };
        let header = to_chain_block(block.header());

        let mut logs_by_tx: HashMap<B256, Vec<LogEntry>> = HashMap::new();
        for log in logs {
            let entry = LogEntry::from(log);
            if let Some(tx_hash) = entry.tx_hash {
                logs_by_tx.entry(tx_hash).or_default().push(entry);
            }
        }

        let transactions = block
            .transactions()
            .txns()
            .map(|tx| {
                let hash = TransactionResponse::tx_hash(tx);
                let mut logs = logs_by_tx.remove(&hash).unwrap_or_default();
                logs.sort_by_key(|log| log.log_index);
                TxRecord {
                    hash,
                    to: alloy_consensus::Transaction::to(tx),
                    logs,
                    block_number: header.number,
                    block_timestamp: header.timestamp,
                }
            })
            .collect();

        Ok(Some(ChainBlockWithTxs { block: header, transactions }))
    }

    async fn logs(&self, query: &LogQuery) -> TransportResult<Vec<LogEntry>> {
        let logs = self.provider.get_logs(&Filter::from(query)).await?;
        Ok(logs.into_iter().map(Into::into).collect())
    }

    async fn call(&self, to: Address, input: Bytes, block_hash: B256) -> TransportResult<Bytes> {
        let request = N::TransactionRequest::default().with_to(to).with_input(input);
        self.provider.call(request).block(BlockId::hash(block_hash)).await
    }

    async fn storage_at(
        &self,
        address: Address,
        slot: U256,
        block_hash: B256,
    ) -> TransportResult<U256> {
        self.provider.get_storage_at(address, slot).block_id(BlockId::hash(block_hash)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_header_converts_to_chain_block() {
        let inner = alloy_consensus::Header {
            parent_hash: B256::repeat_byte(1),
            number: 7,
            timestamp: 1_700_000_000,
            ..Default::default()
        };
        let header = alloy_rpc_types_eth::Header {
            hash: B256::repeat_byte(2),
            inner,
            total_difficulty: None,
            size: None,
        };

        assert_eq!(
            to_chain_block(&header),
            ChainBlock::new(B256::repeat_byte(2), B256::repeat_byte(1), 7, 1_700_000_000)
        );
    }
}
