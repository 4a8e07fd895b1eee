use crate::{metrics::SynchronizerMetrics, SyncError, SynchronizerConfig};
use std::{collections::HashMap, sync::Arc};

use bridge_monitor_primitives::ChainBlock;
use bridge_monitor_providers::{ChainClient, RetryingClient};

/// The edge of the time window a search lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the past: the first block with a timestamp at or after the target.
    Left,
    /// Toward the future: the last block with a timestamp at or before the target.
    Right,
}

/// Maps a timestamp to the L2 block at the edge of a time window.
#[derive(Debug)]
pub struct L2Synchronizer<C> {
    client: Arc<RetryingClient<C>>,
    config: SynchronizerConfig,
    metrics: SynchronizerMetrics,
}

/// The state of a single search: the blocks fetched so far and the fetch budget.
struct Search<'a, C> {
    client: &'a RetryingClient<C>,
    target: u64,
    max_steps: usize,
    steps: usize,
    fetched: HashMap<u64, ChainBlock>,
}

impl<C: ChainClient> Search<'_, C> {
    async fn block(&mut self, number: u64) -> Result<ChainBlock, SyncError> {
        if let Some(block) = self.fetched.get(&number) {
            return Ok(*block);
        }
        if self.steps >= self.max_steps {
            return Err(SyncError::SearchExhausted { target: self.target, steps: self.steps });
        }
        self.steps += 1;
        let block = self.client.block_by_number(number).await?;
        self.fetched.insert(number, block);
        Ok(block)
    }
}

impl<C: ChainClient> L2Synchronizer<C> {
    /// Returns a new [`L2Synchronizer`].
    pub fn new(client: Arc<RetryingClient<C>>, config: SynchronizerConfig) -> Self {
        Self { client, config, metrics: SynchronizerMetrics::default() }
    }

    /// Returns the L2 block at the edge of `target` in the direction, searching blocks up to
    /// and including `known`.
    ///
    /// The first guess extrapolates the average block time of the chain up to `known`. The
    /// bracket around the guess is extended by a fixed offset until it contains the target,
    /// then bisected. Blocks sharing the target timestamp resolve to the last one searching
    /// [`Direction::Right`] and to the first one searching [`Direction::Left`].
    #[tracing::instrument(
        target = "bridge::watcher",
        skip_all,
        fields(target_timestamp = target, ?direction, known = known.number)
    )]
    pub async fn find(
        &self,
        target: u64,
        known: ChainBlock,
        direction: Direction,
    ) -> Result<ChainBlock, SyncError> {
        let mut search = Search {
            client: &self.client,
            target,
            max_steps: self.config.max_steps,
            steps: 0,
            fetched: HashMap::from([(known.number, known)]),
        };
        let result = self.search(&mut search, known, direction).await;

        self.metrics.search_steps.record(search.steps as f64);
        match &result {
            Ok(block) => {
                tracing::trace!(target: "bridge::watcher", number = block.number, timestamp = block.timestamp, steps = search.steps, "located block");
            }
            Err(err) => {
                self.metrics.search_failures.increment(1);
                tracing::debug!(target: "bridge::watcher", ?err, steps = search.steps, "search failed");
            }
        }
        result
    }

    async fn search(
        &self,
        search: &mut Search<'_, C>,
        known: ChainBlock,
        direction: Direction,
    ) -> Result<ChainBlock, SyncError> {
        let target = search.target;
        if target > known.timestamp {
            return match direction {
                Direction::Right => Ok(known),
                Direction::Left => Err(SyncError::TargetOutOfRange { target, direction }),
            };
        }

        let limit = known.number;
        let offset = self.config.extension_offset.max(1);
        let estimate = if known.timestamp == 0 {
            limit
        } else {
            (limit as u128 * target as u128 / known.timestamp as u128) as u64
        };
        let mut low = estimate.saturating_sub(offset);
        let mut high = estimate.saturating_add(offset).min(limit);

        // Extend the bracket until `ts(low) <= target <= ts(high)`.
        loop {
            let low_block = search.block(low).await?;
            if low_block.timestamp > target {
                if low == 0 {
                    return match direction {
                        Direction::Left => Ok(low_block),
                        Direction::Right => Err(SyncError::TargetOutOfRange { target, direction }),
                    };
                }
                high = low;
                low = low.saturating_sub(offset);
                continue;
            }
            let high_block = search.block(high).await?;
            if high_block.timestamp < target {
                low = high;
                high = high.saturating_add(offset).min(limit);
                continue;
            }
            break;
        }

        // Bisect the bracket.
        let (mut left, mut right) = (low, high);
        let mut exact = None;
        while left <= right {
            let mid = left + (right - left) / 2;
            let block = search.block(mid).await?;
            if block.timestamp < target {
                left = mid + 1;
            } else if block.timestamp > target {
                if mid == 0 {
                    break;
                }
                right = mid - 1;
            } else {
                exact = Some(block);
                break;
            }
        }

        let Some(mut candidate) = exact else {
            // `ts(right) < target < ts(left)`.
            return match direction {
                Direction::Right => search.block(right).await,
                Direction::Left => search.block(left).await,
            };
        };

        // Land on the last or first block sharing the target timestamp.
        match direction {
            Direction::Right => {
                while candidate.number < limit {
                    let next = search.block(candidate.number + 1).await?;
                    if next.timestamp != target {
                        break;
                    }
                    candidate = next;
                }
            }
            Direction::Left => {
                while candidate.number > 0 {
                    let previous = search.block(candidate.number - 1).await?;
                    if previous.timestamp != target {
                        break;
                    }
                    candidate = previous;
                }
            }
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_monitor_providers::{
        test_utils::{chain_from_timestamps, drifting_timestamps, MockChainClient},
        CacheConfig, Retry, RpcMethod,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn synchronizer(timestamps: &[u64]) -> (L2Synchronizer<MockChainClient>, Vec<ChainBlock>) {
        let blocks = chain_from_timestamps(2, timestamps);
        let client = RetryingClient::new(
            MockChainClient::new(blocks.clone()),
            "l2",
            Retry::default(),
            CacheConfig::default(),
        );
        (L2Synchronizer::new(Arc::new(client), SynchronizerConfig::default()), blocks)
    }

    /// The expected answer, computed by scanning the whole chain.
    fn expected(blocks: &[ChainBlock], target: u64, direction: Direction) -> Option<ChainBlock> {
        match direction {
            Direction::Right => blocks.iter().rev().find(|b| b.timestamp <= target).copied(),
            Direction::Left => blocks.iter().find(|b| b.timestamp >= target).copied(),
        }
    }

    #[tokio::test]
    async fn test_exact_timestamp_is_found() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..1_000).map(|n| 1_000 + 2 * n).collect();
        let (sync, blocks) = synchronizer(&timestamps);
        let tip = *blocks.last().unwrap();

        let block = sync.find(1_500, tip, Direction::Right).await?;
        assert_eq!(block.number, 250);
        let block = sync.find(1_500, tip, Direction::Left).await?;
        assert_eq!(block.number, 250);

        Ok(())
    }

    #[tokio::test]
    async fn test_gap_resolves_per_direction() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..1_000).map(|n| 1_000 + 2 * n).collect();
        let (sync, blocks) = synchronizer(&timestamps);
        let tip = *blocks.last().unwrap();

        assert_eq!(sync.find(1_501, tip, Direction::Right).await?.number, 250);
        assert_eq!(sync.find(1_501, tip, Direction::Left).await?.number, 251);

        Ok(())
    }

    #[tokio::test]
    async fn test_shared_timestamps_resolve_to_canonical_edge() -> eyre::Result<()> {
        // Blocks 40..=44 share timestamp 500.
        let timestamps: Vec<u64> = (0..100u64)
            .map(|n| match n {
                0..40 => 100 + 10 * n,
                40..=44 => 500,
                _ => 500 + 10 * (n - 44),
            })
            .collect();
        let (sync, blocks) = synchronizer(&timestamps);
        let tip = *blocks.last().unwrap();

        assert_eq!(sync.find(500, tip, Direction::Right).await?.number, 44);
        assert_eq!(sync.find(500, tip, Direction::Left).await?.number, 40);

        Ok(())
    }

    #[tokio::test]
    async fn test_targets_outside_chain() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..50).map(|n| 1_000 + 2 * n).collect();
        let (sync, blocks) = synchronizer(&timestamps);
        let tip = *blocks.last().unwrap();

        assert_eq!(sync.find(5_000, tip, Direction::Right).await?, tip);
        assert!(matches!(
            sync.find(5_000, tip, Direction::Left).await,
            Err(SyncError::TargetOutOfRange { .. })
        ));
        assert_eq!(sync.find(10, tip, Direction::Left).await?.number, 0);
        assert!(matches!(
            sync.find(10, tip, Direction::Right).await,
            Err(SyncError::TargetOutOfRange { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_drifting_chain_matches_linear_scan() -> eyre::Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let timestamps = drifting_timestamps(&mut rng, 1_700_000_000, 3_000, 2, 2);
        let (sync, blocks) = synchronizer(&timestamps);
        let tip = *blocks.last().unwrap();
        let (first, last) = (timestamps[0], *timestamps.last().unwrap());

        for target in (first + 1..last).step_by(97) {
            for direction in [Direction::Left, Direction::Right] {
                let found = sync.find(target, tip, direction).await?;
                assert_eq!(Some(found), expected(&blocks, target, direction), "target {target}");
                assert_eq!(sync.find(target, tip, direction).await?, found);
            }
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_search_is_bounded() -> eyre::Result<()> {
        // A chain whose average block time is far from the local one makes the first guess
        // land thousands of blocks away from the target.
        let timestamps: Vec<u64> = (0..5_000).map(|n| 1_700_000_000 + n).collect();
        let blocks = chain_from_timestamps(2, &timestamps);
        let client = RetryingClient::new(
            MockChainClient::new(blocks.clone()),
            "l2",
            Retry::default(),
            CacheConfig::default(),
        );
        let config = SynchronizerConfig { max_steps: 16, ..Default::default() };
        let sync = L2Synchronizer::new(Arc::new(client), config);

        let err = sync.find(1_700_000_100, blocks[4_999], Direction::Right).await.unwrap_err();

        assert!(matches!(err, SyncError::SearchExhausted { steps: 16, .. }));
        assert_eq!(sync.client.inner().calls(RpcMethod::BlockByNumber), 16);

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_aborts_search() -> eyre::Result<()> {
        let timestamps: Vec<u64> = (0..100).map(|n| 1_000 + 2 * n).collect();
        let (sync, blocks) = synchronizer(&timestamps);
        sync.client.inner().fail_always(RpcMethod::BlockByNumber);

        let err = sync.find(1_050, blocks[99], Direction::Right).await.unwrap_err();

        assert!(matches!(err, SyncError::Network(_)));

        Ok(())
    }
}
