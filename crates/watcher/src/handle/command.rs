use bridge_monitor_primitives::ChainBlock;

/// Commands that can be sent to the monitor worker.
#[derive(Debug, Clone)]
pub enum MonitorCommand {
    /// Run the checks of an L1 block.
    ProcessL1Block(ChainBlock),
}
