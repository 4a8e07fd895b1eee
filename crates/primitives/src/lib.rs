//! Primitive types for the bridge monitor.

pub use block::{ChainBlock, ChainBlockWithTxs, TxRecord};
mod block;

pub use finding::{Finding, FindingType, Severity, NETWORK_ERROR_SUFFIX};
mod finding;

pub use log::LogEntry;
mod log;

pub use response::{EvaluateResponse, ResponseStatus};
mod response;

pub use window::WorkInterval;
mod window;

pub use withdrawal::WithdrawalRecord;
mod withdrawal;
