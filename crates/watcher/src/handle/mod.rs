//! Command handle for the monitor worker.

mod command;

pub use command::MonitorCommand;

use crate::{AgentError, FindingsBuffer};

use bridge_monitor_primitives::{ChainBlock, Finding};
use tokio::sync::mpsc::{error::TrySendError, Sender};

/// Handle to interact with the monitor worker.
#[derive(Debug)]
pub struct MonitorHandle {
    to_worker_tx: Sender<MonitorCommand>,
    buffer: FindingsBuffer,
}

impl MonitorHandle {
    /// Create a new handle with the given command sender and the buffer the worker reports to.
    pub const fn new(to_worker_tx: Sender<MonitorCommand>, buffer: FindingsBuffer) -> Self {
        Self { to_worker_tx, buffer }
    }

    /// Queues the L1 block for processing without waiting for it. Returns false if the queue is
    /// full, in which case the block is skipped.
    pub fn process_l1_block(&self, block: ChainBlock) -> Result<bool, AgentError> {
        self.send_command(MonitorCommand::ProcessL1Block(block))
    }

    /// Returns the findings reported by the worker since the last call.
    pub fn drain(&self) -> Vec<Finding> {
        self.buffer.drain()
    }

    /// Returns true if the worker stopped.
    pub fn is_closed(&self) -> bool {
        self.to_worker_tx.is_closed()
    }

    fn send_command(&self, command: MonitorCommand) -> Result<bool, AgentError> {
        match self.to_worker_tx.try_send(command) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(command)) => {
                tracing::debug!(target: "bridge::watcher", ?command, "monitor worker busy, skipping command");
                Ok(false)
            }
            Err(err) => {
                tracing::error!(target: "bridge::watcher", ?err, "failed to send command to monitor worker");
                Err(AgentError::Shutdown)
            }
        }
    }
}
