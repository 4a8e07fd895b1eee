use crate::{sync::Direction, L2Synchronizer, SyncError, WindowConfig, WindowError};
use std::sync::Arc;

use bridge_monitor_primitives::{ChainBlock, WorkInterval};
use bridge_monitor_providers::{ChainClient, NetworkError, RetryingClient};

/// The L2 blocks in scope for an L1 block.
#[derive(Debug)]
pub struct BlockWindow {
    /// The work interval of the L1 block.
    pub interval: WorkInterval,
    /// The in scope blocks, oldest first.
    pub blocks: Vec<ChainBlock>,
    /// Set if the backward walk was abandoned on a failed parent fetch. The window then only
    /// holds the newest in scope blocks.
    pub abandoned: Option<NetworkError>,
}

impl BlockWindow {
    const fn empty(interval: WorkInterval) -> Self {
        Self { interval, blocks: Vec::new(), abandoned: None }
    }
}

/// Assembles the window of L2 blocks in scope for an L1 block.
#[derive(Debug)]
pub struct WindowBuilder<C> {
    client: Arc<RetryingClient<C>>,
    synchronizer: Arc<L2Synchronizer<C>>,
    config: WindowConfig,
}

impl<C: ChainClient> WindowBuilder<C> {
    /// Returns a new [`WindowBuilder`].
    pub const fn new(
        client: Arc<RetryingClient<C>>,
        synchronizer: Arc<L2Synchronizer<C>>,
        config: WindowConfig,
    ) -> Self {
        Self { client, synchronizer, config }
    }

    /// Returns the work interval of the L1 block.
    pub const fn interval(&self, l1_block: &ChainBlock) -> WorkInterval {
        WorkInterval::around(l1_block.timestamp, self.config.lookback, self.config.lookahead)
    }

    /// Builds the window of the L1 block by locating the newest in scope L2 block and walking
    /// its parent links back until a block falls below the interval.
    #[tracing::instrument(
        target = "bridge::watcher",
        skip_all,
        fields(l1_block = l1_block.number)
    )]
    pub async fn build(&self, l1_block: &ChainBlock) -> Result<BlockWindow, WindowError> {
        let interval = self.interval(l1_block);
        let tip = self.client.latest_block().await?;

        let anchor = if interval.contains(tip.timestamp) {
            tip
        } else if tip.timestamp > interval.end {
            match self.synchronizer.find(interval.end, tip, Direction::Right).await {
                Ok(block) => block,
                Err(SyncError::TargetOutOfRange { .. }) => return Ok(BlockWindow::empty(interval)),
                Err(err) => return Err(err.into()),
            }
        } else {
            tracing::debug!(target: "bridge::watcher", %interval, tip = tip.number, tip_timestamp = tip.timestamp, "L2 tip behind the window");
            return Ok(BlockWindow::empty(interval));
        };

        if !interval.contains(anchor.timestamp) {
            // No L2 block was produced during the interval.
            return Ok(BlockWindow::empty(interval));
        }

        let mut window = BlockWindow { interval, blocks: vec![anchor], abandoned: None };
        let mut current = anchor;
        while current.number > 0 {
            if window.blocks.len() >= self.config.max_walk {
                tracing::warn!(target: "bridge::watcher", %interval, collected = window.blocks.len(), "window walk reached its cap");
                break;
            }
            let parent = match self.client.block_by_hash(current.parent_hash).await {
                Ok(parent) => parent,
                Err(err) => {
                    tracing::warn!(target: "bridge::watcher", %interval, number = current.number - 1, %err, "abandoning window walk");
                    window.abandoned = Some(err);
                    break;
                }
            };
            if interval.is_before(parent.timestamp) {
                break;
            }
            window.blocks.push(parent);
            current = parent;
        }

        window.blocks.reverse();
        tracing::trace!(target: "bridge::watcher", %interval, size = window.blocks.len(), "built window");
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynchronizerConfig;
    use bridge_monitor_providers::{
        test_utils::{chain_from_timestamps, MockChainClient},
        CacheConfig, Retry, RpcMethod,
    };

    const BASE: u64 = 1_700_000_000;

    fn builder(timestamps: &[u64]) -> (WindowBuilder<MockChainClient>, Vec<ChainBlock>) {
        let blocks = chain_from_timestamps(2, timestamps);
        let client = Arc::new(RetryingClient::new(
            MockChainClient::new(blocks.clone()),
            "l2",
            Retry::new(1, 10),
            CacheConfig { latest_ttl: std::time::Duration::ZERO, ..Default::default() },
        ));
        let sync = Arc::new(L2Synchronizer::new(client.clone(), SynchronizerConfig::default()));
        (WindowBuilder::new(client, sync, WindowConfig::default()), blocks)
    }

    fn l1(timestamp: u64) -> ChainBlock {
        ChainBlock { number: 1, timestamp, ..Default::default() }
    }

    #[tokio::test]
    async fn test_window_includes_exactly_interval_blocks() -> eyre::Result<()> {
        // Given: one L2 block per second, the tip well past the interval.
        let timestamps: Vec<u64> = (0..3_000).map(|n| BASE + n).collect();
        let (builder, blocks) = builder(&timestamps);
        let t1 = BASE + 1_500;

        // When
        let window = builder.build(&l1(t1)).await?;

        // Then
        let first = window.blocks.first().unwrap();
        let last = window.blocks.last().unwrap();
        assert_eq!(first.timestamp, t1 - 768);
        assert_eq!(last.timestamp, t1 + 60);
        assert_eq!(window.blocks.len(), 768 + 60 + 1);
        assert!(window.blocks.windows(2).all(|pair| pair[0].is_parent_of(&pair[1])));
        assert!(!window.blocks.iter().any(|b| b.timestamp == t1 - 769 || b.timestamp == t1 + 61));
        assert_eq!(window.blocks[0], blocks[1_500 - 768]);
        assert!(window.abandoned.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_tip_inside_interval_anchors_window() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..100).map(|n| BASE + 2 * n).collect();
        let (builder, blocks) = builder(&timestamps);

        let window = builder.build(&l1(BASE + 180)).await?;

        assert_eq!(window.blocks.last(), blocks.last());
        assert_eq!(window.blocks.len(), 100);
        assert_eq!(builder.client.inner().calls(RpcMethod::BlockByNumber), 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_lagging_tip_bounds_window() -> eyre::Result<()> {
        // Given: the node only reports block 50 although later blocks exist.
        let timestamps: Vec<u64> = (0..100).map(|n| BASE + 2 * n).collect();
        let (builder, blocks) = builder(&timestamps);
        builder.client.inner().set_tip(50);

        // When
        let window = builder.build(&l1(BASE + 180)).await?;

        // Then
        assert_eq!(window.blocks.last(), Some(&blocks[50]));
        assert_eq!(window.blocks.len(), 51);

        Ok(())
    }

    #[tokio::test]
    async fn test_tip_behind_interval_yields_empty_window() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..100).map(|n| BASE + 2 * n).collect();
        let (builder, _) = builder(&timestamps);

        let window = builder.build(&l1(BASE + 10_000)).await?;

        assert!(window.blocks.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_parent_fetch_abandons_walk() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..100).map(|n| BASE + 2 * n).collect();
        let (builder, blocks) = builder(&timestamps);
        builder.client.inner().fail_always(RpcMethod::BlockByHash);

        let window = builder.build(&l1(BASE + 180)).await?;

        assert_eq!(window.blocks, vec![blocks[99]]);
        assert!(window.abandoned.is_some());
        assert_eq!(builder.client.inner().calls(RpcMethod::BlockByHash), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_tip_is_an_error() -> eyre::Result<()> {
        let (builder, _) = builder(&[BASE]);
        builder.client.inner().fail_always(RpcMethod::LatestBlock);

        assert!(matches!(builder.build(&l1(BASE)).await, Err(WindowError::Network(_))));

        Ok(())
    }
}
