//! Command and interaction payload models for the Giotto dispatch library.
//!
//! This crate is pure data: the declared shape of application commands (and
//! its registration wire format), and the typed view of inbound interaction
//! payloads. Handlers, checks and registries live in `giotto_core`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod option;
mod payload;
pub mod serde_util;

pub use command::{ApplicationCommand, CommandKind};
pub use option::{ChoiceValue, CommandOption, OptionChoice, OptionKind};
pub use payload::{
    CommandData, ComponentData, ComponentKind, DataOption, InteractionKind, InteractionPayload,
    Member, ModalData, OptionValue, TextInputValue, User,
};
