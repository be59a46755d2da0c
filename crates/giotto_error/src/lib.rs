//! Error types for the Giotto interaction dispatch library.
//!
//! This crate provides the foundation error types used throughout the Giotto
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use giotto_error::{GiottoResult, RegistryError, RegistryErrorKind};
//!
//! fn register(name: &str) -> GiottoResult<()> {
//!     Err(RegistryError::new(RegistryErrorKind::DuplicateCommand {
//!         name: name.to_string(),
//!     }))?
//! }
//!
//! match register("ping") {
//!     Ok(_) => println!("registered"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod check;
mod dispatch;
mod error;
mod handler;
mod registry;
mod sync;
mod wait;

pub use check::{CheckFailure, CheckFailureKind};
pub use dispatch::{DispatchError, DispatchErrorKind};
pub use error::{GiottoError, GiottoErrorKind, GiottoResult};
pub use handler::HandlerError;
pub use registry::{RegistryError, RegistryErrorKind};
pub use sync::{SyncError, SyncErrorKind};
pub use wait::{WaitError, WaitErrorKind};
