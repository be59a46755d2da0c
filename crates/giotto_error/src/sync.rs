//! Command synchronization error types.

/// Specific synchronization error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SyncErrorKind {
    /// The remote command API rejected or failed an operation.
    #[display("remote {} failed for '{}': {}", operation, command, reason)]
    RemoteApi {
        /// Which remote operation failed (list, create, update, delete).
        operation: String,
        /// The command involved, or `*` for the whole list.
        command: String,
        /// Failure detail from the transport.
        reason: String,
    },

    /// A remote payload could not be decoded into a command model.
    #[display("malformed remote command payload: {}", _0)]
    MalformedSnapshot(String),
}

/// Sync error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Sync Error: {} at line {} in {}", kind, line, file)]
pub struct SyncError {
    kind: SyncErrorKind,
    line: u32,
    file: &'static str,
}

impl SyncError {
    /// Create a new sync error with caller location tracking.
    #[track_caller]
    pub fn new(kind: SyncErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SyncErrorKind {
        &self.kind
    }

    /// Shorthand for a remote API failure.
    #[track_caller]
    pub fn remote(
        operation: impl Into<String>,
        command: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(SyncErrorKind::RemoteApi {
            operation: operation.into(),
            command: command.into(),
            reason: reason.into(),
        })
    }
}
