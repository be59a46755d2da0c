//! Dispatch lifecycle notifications.
//!
//! The engine reports what happened to each interaction through an
//! [`EventSink`] instead of a return value, mirroring the fire-and-forget
//! shape of the inbound event stream. Embedders hang response logic,
//! metrics, or error reporting off the sink.

use crate::context::{CommandContext, ComponentContext};
use async_trait::async_trait;
use giotto_error::GiottoError;
use giotto_model::{InteractionPayload, TextInputValue};

/// One dispatch lifecycle notification.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A command interaction matched a registered command and passed
    /// payload decoding. Emitted before checks run.
    CommandReceived(CommandContext),
    /// A command handler ran to completion.
    CommandComplete(CommandContext),
    /// A check predicate rejected an interaction.
    PermissionDenied {
        /// The context the check rejected.
        ctx: CommandContext,
        /// The check failure, wrapped.
        error: GiottoError,
    },
    /// A handler or the engine failed while processing an interaction.
    Error {
        /// The payload being processed when the failure occurred.
        payload: InteractionPayload,
        /// What failed.
        error: GiottoError,
    },
    /// A component binding's handler ran to completion.
    ComponentComplete(ComponentContext),
    /// A check predicate rejected a component binding.
    ComponentDenied {
        /// The context the check rejected.
        ctx: ComponentContext,
        /// The check failure, wrapped.
        error: GiottoError,
    },
    /// A component event matched no binding and fulfilled no waiter.
    ComponentsUnhandled(ComponentContext),
    /// An autocomplete request resolved to a registered command path.
    Autocomplete {
        /// The resolved context, args carrying the partial values.
        ctx: CommandContext,
        /// Names of the focused options.
        focused: Vec<String>,
    },
    /// A modal was submitted.
    ModalSubmit {
        /// The raw interaction payload.
        payload: InteractionPayload,
        /// Custom id of the modal.
        custom_id: String,
        /// Submitted text inputs, flattened out of their rows.
        inputs: Vec<TextInputValue>,
    },
}

/// Receiver for dispatch lifecycle notifications.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one notification.
    async fn emit(&self, event: DispatchEvent);
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: DispatchEvent) {}
}

/// Sink that records notifications in order, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<DispatchEvent>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded notifications, in emission order.
    pub fn events(&self) -> Vec<DispatchEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: DispatchEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
