/// Expected failure of the clone/verify/checkout pipeline.
///
/// This travels up the call chain as an ordinary error value and is handled
/// exactly once, at the top of the bootstrap: the clone workspace is deleted
/// wholesale and the process exits nonzero. It never reaches the relaunch
/// step.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CloneFailure {
    message: String,
    detail: Option<String>,
}

impl CloneFailure {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub(crate) fn with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Raw output of the underlying tool, when any was captured.
    /// Verification failures carry the signing tool's diagnostics verbatim
    /// so the user can audit the cause.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}
