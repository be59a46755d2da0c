//! Handler error type.

/// Error raised by a user-supplied handler body, with source location.
///
/// Handler bodies may fail for any domain reason; the dispatch engine catches
/// this at the boundary and reports it through the event sink rather than
/// letting it reach the transport loop.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Handler Error: {} at line {} in {}", message, line, file)]
pub struct HandlerError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HandlerError {
    /// Create a new HandlerError with the given message at the current
    /// location.
    ///
    /// # Examples
    ///
    /// ```
    /// use giotto_error::HandlerError;
    ///
    /// let err = HandlerError::new("lookup failed");
    /// assert!(err.message.contains("lookup"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
