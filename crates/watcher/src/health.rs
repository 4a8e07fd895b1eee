use crate::HealthConfig;

use bridge_monitor_primitives::Finding;
use tokio::time::Instant;

/// The health of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The monitor is healthy.
    Healthy,
    /// Too many network errors were reported. Terminal until restart.
    Unhealthy,
}

/// Trips the monitor to [`HealthStatus::Unhealthy`] once the network errors reported within a
/// time window reach a ceiling.
#[derive(Debug)]
pub struct HealthChecker {
    config: HealthConfig,
    status: HealthStatus,
    window_start: Option<Instant>,
    errors: usize,
}

impl HealthChecker {
    /// Returns a new healthy [`HealthChecker`].
    pub const fn new(config: HealthConfig) -> Self {
        Self { config, status: HealthStatus::Healthy, window_start: None, errors: 0 }
    }

    /// Returns the current status.
    pub const fn status(&self) -> HealthStatus {
        self.status
    }

    /// Returns true if the monitor is healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Accounts the network errors of the batch and returns the resulting status.
    pub fn check(&mut self, findings: &[Finding]) -> HealthStatus {
        self.check_at(findings, Instant::now())
    }

    /// Accounts the network errors of the batch, reported at `now`.
    pub fn check_at(&mut self, findings: &[Finding], now: Instant) -> HealthStatus {
        if self.status == HealthStatus::Unhealthy {
            return self.status;
        }

        let count = findings.iter().filter(|finding| finding.is_network_error()).count();
        if count >= self.config.error_ceiling {
            return self.trip(count);
        }

        if self.window_start.is_some_and(|start| now.duration_since(start) > self.config.window) {
            tracing::debug!(target: "bridge::watcher", errors = self.errors, "health window elapsed");
            self.window_start = None;
            self.errors = 0;
        }
        if count == 0 {
            return self.status;
        }

        self.window_start.get_or_insert(now);
        self.errors += count;
        if self.errors >= self.config.error_ceiling {
            return self.trip(self.errors);
        }
        self.status
    }

    fn trip(&mut self, errors: usize) -> HealthStatus {
        tracing::error!(target: "bridge::watcher", errors, ceiling = self.config.error_ceiling, window = ?self.config.window, "network error ceiling reached, monitor unhealthy");
        self.status = HealthStatus::Unhealthy;
        self.status
    }
}
