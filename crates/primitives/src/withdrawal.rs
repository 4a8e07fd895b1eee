use alloy_primitives::U256;

/// A single L2 to L1 withdrawal initiated on the bridge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalRecord {
    /// The timestamp of the L2 block including the withdrawal.
    pub timestamp: u64,
    /// The withdrawn amount, in the token's base units.
    pub amount: U256,
}

impl WithdrawalRecord {
    /// Returns a new [`WithdrawalRecord`].
    pub const fn new(timestamp: u64, amount: U256) -> Self {
        Self { timestamp, amount }
    }
}
