use std::sync::Arc;

use bridge_monitor_primitives::Finding;
use parking_lot::Mutex;

/// The findings produced by background work, waiting to be reported.
///
/// Findings are reported by the request following the one that triggered their production,
/// or later. Each finding is returned by exactly one [`FindingsBuffer::drain`].
#[derive(Debug, Clone, Default)]
pub struct FindingsBuffer {
    inner: Arc<Mutex<Vec<Finding>>>,
}

impl FindingsBuffer {
    /// Appends a finding.
    pub fn push(&self, finding: Finding) {
        self.inner.lock().push(finding);
    }

    /// Appends the findings.
    pub fn extend(&self, findings: impl IntoIterator<Item = Finding>) {
        self.inner.lock().extend(findings);
    }

    /// Returns the buffered findings and clears the buffer.
    pub fn drain(&self) -> Vec<Finding> {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Returns the number of buffered findings.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if no finding is buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
