use crate::Finding;

/// The status of an evaluation response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The request was served, possibly with error findings.
    #[default]
    Success,
    /// The request could not be served.
    Error,
}

/// The response to a block or transaction evaluation request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvaluateResponse {
    /// The status of the response.
    pub status: ResponseStatus,
    /// The findings reported by the response.
    pub findings: Vec<Finding>,
}

impl EvaluateResponse {
    /// Returns a successful response carrying the provided findings.
    pub const fn success(findings: Vec<Finding>) -> Self {
        Self { status: ResponseStatus::Success, findings }
    }

    /// Returns an error response carrying the provided findings.
    pub const fn error(findings: Vec<Finding>) -> Self {
        Self { status: ResponseStatus::Error, findings }
    }

    /// Returns true if the response has a success status.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
