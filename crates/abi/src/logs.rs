use alloy_primitives::Log;
use alloy_sol_types::{sol, SolEvent};

sol! {
    /// Emitted by the L2 standard bridge when a withdrawal to L1 is initiated.
    #[derive(Debug)]
    event WithdrawalInitiated(
        address indexed l1Token,
        address indexed l2Token,
        address indexed from,
        address to,
        uint256 amount,
        bytes extraData
    );

    #[derive(Debug)]
    event Upgraded(address indexed implementation);

    #[derive(Debug)]
    event AdminChanged(address previousAdmin, address newAdmin);

    #[derive(Debug)]
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

    #[derive(Debug)]
    event Paused(address account);

    #[derive(Debug)]
    event Unpaused(address account);
}

/// Tries to decode the provided log into the type T.
pub fn try_decode_log<T: SolEvent>(log: &Log) -> Option<Log<T>> {
    T::decode_log(log).ok()
}
