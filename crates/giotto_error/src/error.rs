//! Top-level error wrapper types.

use crate::{CheckFailure, DispatchError, HandlerError, RegistryError, SyncError, WaitError};

/// This is the foundation error enum. Each giotto crate contributes the
/// variants for its own failure domain.
///
/// # Examples
///
/// ```
/// use giotto_error::{GiottoError, RegistryError};
///
/// let reg_err = RegistryError::not_found("ping");
/// let err: GiottoError = reg_err.into();
/// assert!(format!("{}", err).contains("Registry Error"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum GiottoErrorKind {
    /// Command/component registry error
    #[from(RegistryError)]
    Registry(RegistryError),
    /// Check predicate failure
    #[from(CheckFailure)]
    Check(CheckFailure),
    /// One-shot wait timeout or cancellation
    #[from(WaitError)]
    Wait(WaitError),
    /// Remote command synchronization error
    #[from(SyncError)]
    Sync(SyncError),
    /// Dispatch engine error
    #[from(DispatchError)]
    Dispatch(DispatchError),
    /// User handler error
    #[from(HandlerError)]
    Handler(HandlerError),
}

/// Giotto error with kind discrimination.
///
/// # Examples
///
/// ```
/// use giotto_error::{GiottoResult, WaitError, WaitErrorKind};
///
/// fn might_fail() -> GiottoResult<()> {
///     Err(WaitError::new(WaitErrorKind::Timeout))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Giotto Error: {}", _0)]
pub struct GiottoError(Box<GiottoErrorKind>);

impl GiottoError {
    /// Create a new error from a kind.
    pub fn new(kind: GiottoErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &GiottoErrorKind {
        &self.0
    }

    /// Whether this error originated from a check predicate.
    ///
    /// Dispatch uses this to route the failure to the permission-error
    /// notification in addition to the generic error notification.
    pub fn is_check_failure(&self) -> bool {
        matches!(*self.0, GiottoErrorKind::Check(_))
    }

    /// Whether this error is a wait timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(&*self.0, GiottoErrorKind::Wait(w) if w.is_timeout())
    }
}

// Generic From implementation for any type that converts to GiottoErrorKind
impl<T> From<T> for GiottoError
where
    T: Into<GiottoErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Giotto operations.
///
/// # Examples
///
/// ```
/// use giotto_error::{GiottoResult, HandlerError};
///
/// fn run_handler() -> GiottoResult<String> {
///     Err(HandlerError::new("boom"))?
/// }
/// ```
pub type GiottoResult<T> = std::result::Result<T, GiottoError>;
