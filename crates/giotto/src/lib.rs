//! Giotto - Discord Interaction Dispatch
//!
//! Giotto routes decoded Discord interaction events to registered commands
//! and component handlers. It owns the command model, the check predicates
//! gating execution, one-shot component waits, and synchronization of local
//! command declarations against the remote command list. It deliberately
//! owns no transport: the embedder feeds it payloads and supplies the remote
//! command API.
//!
//! # Features
//!
//! - **Command Model**: Slash, user, and message commands with subcommand
//!   groups, typed options, and handler parameter binding
//! - **Check Engine**: Ordered async predicates with short-circuiting and an
//!   any-of combinator
//! - **Component Registry**: Persistent custom-id bindings plus one-shot
//!   `wait_for` futures with timeouts
//! - **Remote Sync**: Cached diffing against the remote command list, queued
//!   offline registration, and a stale-command sweep
//! - **Event Sink**: Every dispatch outcome reported through one async seam
//!
//! # Quick Start
//!
//! ```rust
//! use giotto::{command_handler, CommandBuilder, DispatchConfig, DispatchCore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> giotto::GiottoResult<()> {
//!     let mut core = DispatchCore::new(DispatchConfig::new(1234));
//!     let handler = command_handler(|ctx| async move {
//!         println!("pong for {}", ctx.qualified_name());
//!         Ok(())
//!     });
//!     core.register_command(CommandBuilder::new("ping", handler).build()?)?;
//!     // Feed `core.process(payload)` from your gateway or webhook loop.
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Giotto is organized as a workspace with focused crates:
//!
//! - `giotto_error` - Error types
//! - `giotto_model` - Command declarations and interaction payload models
//! - `giotto_core` - Registries, checks, sync, and the dispatch engine
//!
//! This crate (`giotto`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use giotto_core::*;
pub use giotto_error::*;
pub use giotto_model::*;
