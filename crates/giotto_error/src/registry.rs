//! Command registry error types.

/// Specific registry error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RegistryErrorKind {
    /// A command with the same name already exists in its kind namespace.
    #[display("Duplicate command: {}", name)]
    DuplicateCommand {
        /// Name of the conflicting command.
        name: String,
    },

    /// No command with the given name exists.
    #[display("Command not found: {}", name)]
    CommandNotFound {
        /// Name of the missing command.
        name: String,
    },

    /// A component binding was looked up but is not registered.
    #[display("Component not found: {}", custom_id)]
    ComponentNotFound {
        /// Custom id of the missing component binding.
        custom_id: String,
    },

    /// A command or option tree failed structural validation.
    #[display("Invalid option configuration for '{}': {}", command, reason)]
    InvalidOptionConfiguration {
        /// Command the offending option belongs to.
        command: String,
        /// Why the configuration is invalid.
        reason: String,
    },
}

/// Registry error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    kind: RegistryErrorKind,
    line: u32,
    file: &'static str,
}

impl RegistryError {
    /// Create a new registry error with caller location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RegistryErrorKind {
        &self.kind
    }

    /// Shorthand for a duplicate-command error.
    #[track_caller]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::new(RegistryErrorKind::DuplicateCommand { name: name.into() })
    }

    /// Shorthand for a command-not-found error.
    #[track_caller]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(RegistryErrorKind::CommandNotFound { name: name.into() })
    }

    /// Shorthand for an invalid-option-configuration error.
    #[track_caller]
    pub fn invalid_options(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(RegistryErrorKind::InvalidOptionConfiguration {
            command: command.into(),
            reason: reason.into(),
        })
    }
}
