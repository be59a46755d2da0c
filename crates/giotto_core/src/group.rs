//! Interaction groups: named bundles of commands and component bindings.
//!
//! Groups let a feature area (moderation, music, settings) register as one
//! unit. Commands registered through a group carry the group's name in
//! their execution context.

use crate::command::Command;
use crate::component::ComponentBinding;

/// A named bundle of commands and component bindings.
#[derive(Debug, Default)]
pub struct InteractionGroup {
    name: String,
    commands: Vec<Command>,
    components: Vec<ComponentBinding>,
}

impl InteractionGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a command.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Append a component binding.
    pub fn component(mut self, binding: ComponentBinding) -> Self {
        self.components.push(binding);
        self
    }

    /// The bundled commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The bundled component bindings.
    pub fn components(&self) -> &[ComponentBinding] {
        &self.components
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Command>, Vec<ComponentBinding>) {
        (self.name, self.commands, self.components)
    }
}
