//! Dispatch engine error types.

/// Specific dispatch error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DispatchErrorKind {
    /// The payload named a subcommand path the local tree does not declare.
    #[display("unknown subcommand path '{}' under command '{}'", path, command)]
    UnknownSubcommand {
        /// Root command name.
        command: String,
        /// The undeclared group/subcommand path from the payload.
        path: String,
    },

    /// An inbound payload was missing a field the engine requires.
    #[display("malformed interaction payload: {}", _0)]
    MalformedPayload(String),
}

/// Dispatch error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Dispatch Error: {} at line {} in {}", kind, line, file)]
pub struct DispatchError {
    kind: DispatchErrorKind,
    line: u32,
    file: &'static str,
}

impl DispatchError {
    /// Create a new dispatch error with caller location tracking.
    #[track_caller]
    pub fn new(kind: DispatchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DispatchErrorKind {
        &self.kind
    }
}
