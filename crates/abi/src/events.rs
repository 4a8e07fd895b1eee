use crate::logs::{try_decode_log, AdminChanged, OwnershipTransferred, Paused, Unpaused, Upgraded};

use alloy_primitives::B256;
use alloy_sol_types::SolEvent;
use bridge_monitor_primitives::{Finding, FindingType, LogEntry, Severity};
use strum::IntoEnumIterator;

/// A contract event the monitor raises a finding for whenever it is emitted by a
/// watched contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum WatchedEvent {
    /// The proxy implementation was upgraded.
    Upgraded,
    /// The proxy admin was changed.
    AdminChanged,
    /// The contract ownership was transferred.
    OwnershipTransferred,
    /// The contract was paused.
    Paused,
    /// The contract was unpaused.
    Unpaused,
}

impl WatchedEvent {
    /// Returns the watched event matching the log's signature, if any.
    pub fn from_log(entry: &LogEntry) -> Option<Self> {
        let signature = entry.signature()?;
        Self::iter().find(|event| event.signature() == signature)
    }

    /// The event signature hash.
    pub const fn signature(&self) -> B256 {
        match self {
            Self::Upgraded => Upgraded::SIGNATURE_HASH,
            Self::AdminChanged => AdminChanged::SIGNATURE_HASH,
            Self::OwnershipTransferred => OwnershipTransferred::SIGNATURE_HASH,
            Self::Paused => Paused::SIGNATURE_HASH,
            Self::Unpaused => Unpaused::SIGNATURE_HASH,
        }
    }

    /// The alert id for findings raised by the event.
    pub const fn alert_id(&self) -> &'static str {
        match self {
            Self::Upgraded => "BRIDGE-PROXY-UPGRADED",
            Self::AdminChanged => "BRIDGE-PROXY-ADMIN-CHANGED",
            Self::OwnershipTransferred => "BRIDGE-OWNERSHIP-TRANSFERRED",
            Self::Paused => "BRIDGE-PAUSED",
            Self::Unpaused => "BRIDGE-UNPAUSED",
        }
    }

    /// The finding name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Upgraded => "Proxy implementation upgraded",
            Self::AdminChanged => "Proxy admin changed",
            Self::OwnershipTransferred => "Ownership transferred",
            Self::Paused => "Contract paused",
            Self::Unpaused => "Contract unpaused",
        }
    }

    /// The finding severity.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Upgraded | Self::AdminChanged | Self::OwnershipTransferred => Severity::High,
            Self::Paused => Severity::Critical,
            Self::Unpaused => Severity::Medium,
        }
    }

    /// The finding type.
    pub const fn finding_type(&self) -> FindingType {
        match self {
            Self::Unpaused => FindingType::Info,
            _ => FindingType::Suspicious,
        }
    }

    /// Decodes the log and renders the finding description. Returns `None` if the
    /// log does not decode as the event.
    pub fn describe(&self, entry: &LogEntry) -> Option<String> {
        let contract = entry.address();
        let description = match self {
            Self::Upgraded => {
                let log = try_decode_log::<Upgraded>(&entry.inner)?;
                format!("{contract} upgraded to implementation {}", log.data.implementation)
            }
            Self::AdminChanged => {
                let log = try_decode_log::<AdminChanged>(&entry.inner)?;
                format!(
                    "{contract} admin changed from {} to {}",
                    log.data.previousAdmin, log.data.newAdmin
                )
            }
            Self::OwnershipTransferred => {
                let log = try_decode_log::<OwnershipTransferred>(&entry.inner)?;
                format!(
                    "{contract} ownership transferred from {} to {}",
                    log.data.previousOwner, log.data.newOwner
                )
            }
            Self::Paused => {
                let log = try_decode_log::<Paused>(&entry.inner)?;
                format!("{contract} paused by {}", log.data.account)
            }
            Self::Unpaused => {
                let log = try_decode_log::<Unpaused>(&entry.inner)?;
                format!("{contract} unpaused by {}", log.data.account)
            }
        };
        Some(description)
    }

    /// Returns the finding for the log, tagged with the chain it was observed on.
    pub fn finding(&self, entry: &LogEntry, chain: &str) -> Option<Finding> {
        let description = self.describe(entry)?;
        let mut finding = Finding::new(
            self.alert_id(),
            self.name(),
            description,
            self.severity(),
            self.finding_type(),
        )
        .with_metadata("chain", chain)
        .with_metadata("contract", entry.address());
        if let Some(tx_hash) = entry.tx_hash {
            finding = finding.with_metadata("transaction", tx_hash);
        }
        if let Some(number) = entry.block_number {
            finding = finding.with_metadata("block", number);
        }
        Some(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Log};
    use alloy_sol_types::SolEvent;

    fn entry_for<T: SolEvent>(event: &T) -> LogEntry {
        let contract = address!("0x4200000000000000000000000000000000000010");
        LogEntry {
            inner: Log { address: contract, data: event.encode_log_data() },
            block_number: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_signatures_are_distinct() {
        let signatures: std::collections::HashSet<_> =
            WatchedEvent::iter().map(|e| e.signature()).collect();
        assert_eq!(signatures.len(), WatchedEvent::iter().count());
    }

    #[test]
    fn test_upgraded_log_matches_and_describes() {
        let implementation = address!("0x1111111111111111111111111111111111111111");
        let entry = entry_for(&Upgraded { implementation });

        let event = WatchedEvent::from_log(&entry).unwrap();
        assert_eq!(event, WatchedEvent::Upgraded);

        let finding = event.finding(&entry, "l2").unwrap();
        assert_eq!(finding.alert_id, "BRIDGE-PROXY-UPGRADED");
        assert_eq!(finding.severity, Severity::High);
        assert!(finding.description.contains(&implementation.to_string()));
        assert_eq!(finding.metadata.get("block").unwrap(), "42");
    }

    #[test]
    fn test_unwatched_log_is_ignored() {
        let entry = LogEntry::default();
        assert!(WatchedEvent::from_log(&entry).is_none());
    }
}
