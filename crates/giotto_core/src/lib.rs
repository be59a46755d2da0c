//! Interaction dispatch core.
//!
//! Routes inbound interaction events to registered commands and component
//! handlers, gates execution with ordered check predicates, and reconciles
//! local command declarations against the remote command list through a
//! transport-agnostic API seam.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod check;
mod command;
mod component;
mod config;
mod context;
mod dispatch;
mod event;
mod group;
mod handler;
mod registry;
mod sync;

pub use check::{
    check_any, dm_only, guild_only, has_any_role, has_role, is_owner, run_checks, CheckList,
    CheckPredicate, CheckResult,
};
pub use command::{
    Command, CommandBody, CommandBuilder, GroupBuilder, Subcommand, SubcommandBuilder,
    SubcommandGroup,
};
pub use component::{any_component, kind_filter, ComponentBinding, ComponentRegistry, WaitFilter};
pub use config::{DispatchConfig, DispatchConfigBuilder, DispatchConfigBuilderError};
pub use context::{CommandContext, ComponentContext};
pub use dispatch::DispatchCore;
pub use event::{DispatchEvent, EventSink, NullSink, RecordingSink};
pub use group::InteractionGroup;
pub use handler::{
    command_handler, component_handler, CommandHandler, ComponentHandler, FnCommandHandler,
    FnComponentHandler, ParameterSpec,
};
pub use registry::CommandRegistry;
pub use sync::{RemoteCommandApi, Synchronizer};
