//! Check failure types.
//!
//! Check predicates report failure as a value rather than by raising; this
//! type is the value they produce. Dispatch routes it to a permission-error
//! notification instead of the generic error channel.

/// Specific check failure conditions.
#[derive(Debug, Clone, derive_more::Display)]
pub enum CheckFailureKind {
    /// A single predicate rejected the context.
    #[display("check '{}' failed: {}", check, reason)]
    Predicate {
        /// Identity of the failing predicate.
        check: String,
        /// Why the predicate rejected the context.
        reason: String,
    },

    /// Every alternative of a `check_any` combinator failed.
    #[display("all {} alternative checks failed", _0.len())]
    Any(Vec<CheckFailure>),
}

/// Check failure with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Check Failure: {} at line {} in {}", kind, line, file)]
pub struct CheckFailure {
    kind: CheckFailureKind,
    line: u32,
    file: &'static str,
}

impl CheckFailure {
    /// Create a new check failure with caller location tracking.
    #[track_caller]
    pub fn new(kind: CheckFailureKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Failure of a single named predicate.
    #[track_caller]
    pub fn predicate(check: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(CheckFailureKind::Predicate {
            check: check.into(),
            reason: reason.into(),
        })
    }

    /// Aggregate failure of a `check_any` combinator.
    #[track_caller]
    pub fn any(failures: Vec<CheckFailure>) -> Self {
        Self::new(CheckFailureKind::Any(failures))
    }

    /// Get the failure kind.
    pub fn kind(&self) -> &CheckFailureKind {
        &self.kind
    }

    /// Identity of the failing predicate, if this is a single-predicate
    /// failure.
    pub fn check_name(&self) -> Option<&str> {
        match &self.kind {
            CheckFailureKind::Predicate { check, .. } => Some(check),
            CheckFailureKind::Any(_) => None,
        }
    }
}
