use std::{collections::BTreeMap, fmt};

/// The alert id suffix shared by all findings that report a failed chain read.
pub const NETWORK_ERROR_SUFFIX: &str = "NETWORK-ERROR";

/// The severity of a [`Finding`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum Severity {
    /// Unknown severity, used for degraded service findings.
    #[default]
    Unknown,
    /// Informational.
    Info,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

/// The type of a [`Finding`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FindingType {
    /// Informational.
    #[default]
    Info,
    /// Suspicious activity or invariant violation.
    Suspicious,
    /// The monitor itself is degraded.
    Degraded,
}

/// An alert emitted to the outside world.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The alert identifier.
    pub alert_id: String,
    /// A short name for the alert.
    pub name: String,
    /// A human readable description.
    pub description: String,
    /// The severity of the finding.
    pub severity: Severity,
    /// The type of the finding.
    pub finding_type: FindingType,
    /// An optional key used to de-duplicate findings at the alerting layer.
    pub unique_key: Option<String>,
    /// Additional key-value metadata.
    pub metadata: BTreeMap<String, String>,
}

impl Finding {
    /// Returns a new [`Finding`] without unique key or metadata.
    pub fn new(
        alert_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        finding_type: FindingType,
    ) -> Self {
        Self {
            alert_id: alert_id.into(),
            name: name.into(),
            description: description.into(),
            severity,
            finding_type,
            unique_key: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Returns a degraded finding reporting a failed chain read, with alert id
    /// `{prefix}-NETWORK-ERROR`.
    pub fn network_error(prefix: &str, error: impl fmt::Display) -> Self {
        let description = error.to_string();
        Self::new(
            format!("{prefix}-{NETWORK_ERROR_SUFFIX}"),
            "Network error",
            description.clone(),
            Severity::Unknown,
            FindingType::Degraded,
        )
        .with_metadata("error", description)
    }

    /// Sets the unique key of the finding.
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }

    /// Inserts a metadata entry in the finding.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    /// Returns true if the finding reports a network error.
    pub fn is_network_error(&self) -> bool {
        self.finding_type == FindingType::Degraded && self.alert_id.ends_with(NETWORK_ERROR_SUFFIX)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}: {}", self.severity, self.alert_id, self.name, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_finding_is_flagged() {
        let finding = Finding::network_error("BRIDGE-BALANCE", "could not call eth_call");

        assert_eq!(finding.alert_id, "BRIDGE-BALANCE-NETWORK-ERROR");
        assert_eq!(finding.severity, Severity::Unknown);
        assert!(finding.is_network_error());
        assert_eq!(finding.metadata.get("error").unwrap(), "could not call eth_call");
    }

    #[test]
    fn test_suspicious_finding_is_not_network_error() {
        let finding = Finding::new(
            "BRIDGE-NETWORK-ERROR",
            "spoofed",
            "",
            Severity::High,
            FindingType::Suspicious,
        );
        assert!(!finding.is_network_error());
    }
}
