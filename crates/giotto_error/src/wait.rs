//! One-shot wait error types.

/// Specific wait error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WaitErrorKind {
    /// No matching component event arrived before the deadline.
    #[display("wait timed out")]
    Timeout,

    /// The waiting side was dropped or the registry fulfilled and discarded
    /// the waiter before the caller observed the result.
    #[display("wait was cancelled")]
    Cancelled,
}

/// Wait error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Wait Error: {} at line {} in {}", kind, line, file)]
pub struct WaitError {
    kind: WaitErrorKind,
    line: u32,
    file: &'static str,
}

impl WaitError {
    /// Create a new wait error with caller location tracking.
    #[track_caller]
    pub fn new(kind: WaitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WaitErrorKind {
        &self.kind
    }

    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        self.kind == WaitErrorKind::Timeout
    }
}
