/// The inclusive span of L2 timestamps relevant to a single L1 block.
///
/// An L2 block at `t2` is in scope for an L1 block at `t1` iff
/// `t1 - lookback <= t2 <= t1 + lookahead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("[{start}, {end}]")]
pub struct WorkInterval {
    /// The lowest in-scope timestamp.
    pub start: u64,
    /// The highest in-scope timestamp.
    pub end: u64,
}

impl WorkInterval {
    /// Returns the interval around the L1 timestamp `anchor`.
    pub const fn around(anchor: u64, lookback: u64, lookahead: u64) -> Self {
        Self { start: anchor.saturating_sub(lookback), end: anchor.saturating_add(lookahead) }
    }

    /// Returns true if the timestamp is in scope.
    pub const fn contains(&self, timestamp: u64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// Returns true if the timestamp is strictly older than the interval.
    pub const fn is_before(&self, timestamp: u64) -> bool {
        timestamp < self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds_are_inclusive() {
        let t1 = 1_700_000_000;
        let interval = WorkInterval::around(t1, 768, 60);

        assert!(interval.contains(t1 - 768));
        assert!(interval.contains(t1 + 60));
        assert!(interval.contains(t1));
        assert!(!interval.contains(t1 - 769));
        assert!(!interval.contains(t1 + 61));
        assert!(interval.is_before(t1 - 769));
        assert!(!interval.is_before(t1 - 768));
    }

    #[test]
    fn test_interval_saturates_near_genesis() {
        let interval = WorkInterval::around(100, 768, 60);
        assert_eq!(interval, WorkInterval { start: 0, end: 160 });
    }
}
