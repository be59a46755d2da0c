//! Execution contexts handed to handlers and checks.

use giotto_model::{ComponentData, ComponentKind, InteractionPayload, OptionValue};
use std::collections::HashMap;

/// Context for one application-command invocation.
///
/// `args` carries the supplied option values keyed by the handler's bound
/// parameter names (options with an explicit parameter override were remapped
/// at dispatch time; everything else keeps its option name).
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct CommandContext {
    /// The raw interaction payload.
    payload: InteractionPayload,
    /// Root command name.
    command: String,
    /// Subcommand path segments below the root, outermost first.
    path: Vec<String>,
    /// Supplied option values keyed by bound parameter name.
    args: HashMap<String, OptionValue>,
    /// Name of the owning group, if the command was registered through one.
    group: Option<String>,
}

impl CommandContext {
    pub(crate) fn new(
        payload: InteractionPayload,
        command: String,
        path: Vec<String>,
        args: HashMap<String, OptionValue>,
        group: Option<String>,
    ) -> Self {
        Self {
            payload,
            command,
            path,
            args,
            group,
        }
    }

    /// Fully qualified command name, space separated.
    pub fn qualified_name(&self) -> String {
        let mut name = self.command.clone();
        for segment in &self.path {
            name.push(' ');
            name.push_str(segment);
        }
        name
    }

    /// Supplied value for a bound parameter name.
    pub fn arg(&self, parameter: &str) -> Option<&OptionValue> {
        self.args.get(parameter)
    }
}

/// Context for one component interaction (button press, select submission).
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ComponentContext {
    /// The raw interaction payload.
    payload: InteractionPayload,
    /// The decoded component body.
    data: ComponentData,
}

impl ComponentContext {
    pub(crate) fn new(payload: InteractionPayload, data: ComponentData) -> Self {
        Self { payload, data }
    }

    /// Custom id routing key of the activated component.
    pub fn custom_id(&self) -> &str {
        self.data.custom_id()
    }

    /// Kind of the activated component.
    pub fn component_kind(&self) -> ComponentKind {
        *self.data.component_type()
    }

    /// Selected values, for select menus.
    pub fn values(&self) -> &[String] {
        self.data.values()
    }
}
