//! Command registry: local command storage keyed by kind and name.
//!
//! Slash, user and message commands live in separate namespaces, so one
//! name may appear once per kind.

use crate::command::Command;
use giotto_error::{GiottoResult, RegistryError};
use giotto_model::CommandKind;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Local command storage, one namespace per command kind.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    namespaces: [HashMap<String, Command>; 3],
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command in its kind's namespace.
    ///
    /// Rejects duplicates and runs the handler parameter binding pass, so a
    /// registered command always carries a reconciled option list.
    #[instrument(skip(self, command), fields(name = command.name(), kind = %command.kind()))]
    pub fn register(&mut self, mut command: Command) -> GiottoResult<()> {
        let namespace = &mut self.namespaces[command.kind().index()];
        if namespace.contains_key(command.name()) {
            return Err(RegistryError::duplicate(command.name()).into());
        }
        command.bind_handler_parameters()?;
        debug!("command registered");
        namespace.insert(command.name().to_string(), command);
        Ok(())
    }

    /// Remove a command from its kind's namespace, returning it.
    #[instrument(skip(self))]
    pub fn unregister(&mut self, kind: CommandKind, name: &str) -> GiottoResult<Command> {
        self.namespaces[kind.index()]
            .remove(name)
            .ok_or_else(|| RegistryError::not_found(name).into())
    }

    /// Look up a command by kind and name.
    pub fn get(&self, kind: CommandKind, name: &str) -> Option<&Command> {
        self.namespaces[kind.index()].get(name)
    }

    /// Mutable lookup by kind and name.
    pub fn get_mut(&mut self, kind: CommandKind, name: &str) -> Option<&mut Command> {
        self.namespaces[kind.index()].get_mut(name)
    }

    /// Whether a command is registered under a kind and name.
    pub fn contains(&self, kind: CommandKind, name: &str) -> bool {
        self.namespaces[kind.index()].contains_key(name)
    }

    /// Every registered command across all namespaces.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.namespaces.iter().flat_map(HashMap::values)
    }

    /// Mutable iteration across all namespaces.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.namespaces.iter_mut().flat_map(HashMap::values_mut)
    }

    /// Names registered under one kind.
    pub fn names(&self, kind: CommandKind) -> Vec<String> {
        self.namespaces[kind.index()].keys().cloned().collect()
    }

    /// Total number of registered commands.
    pub fn len(&self) -> usize {
        self.namespaces.iter().map(HashMap::len).sum()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;
    use crate::handler::command_handler;
    use giotto_error::{GiottoErrorKind, RegistryErrorKind};
    use std::sync::Arc;

    fn command(name: &str) -> Command {
        CommandBuilder::new(name, command_handler(|_ctx| async move { Ok(()) }))
            .build()
            .expect("builds")
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(command("ping")).expect("first registers");
        let error = registry
            .register(command("ping"))
            .expect_err("second rejected");
        match error.kind() {
            GiottoErrorKind::Registry(reg) => {
                assert!(matches!(
                    reg.kind(),
                    RegistryErrorKind::DuplicateCommand { .. }
                ));
            }
            other => panic!("expected registry error, got {other:?}"),
        }
    }

    #[test]
    fn kinds_are_separate_namespaces() {
        let mut registry = CommandRegistry::new();
        registry.register(command("info")).expect("slash registers");
        let user = Command::user("info", command_handler(|_ctx| async move { Ok(()) }));
        registry.register(user).expect("user command registers");
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(CommandKind::ChatInput, "info"));
        assert!(registry.contains(CommandKind::User, "info"));
        assert!(!registry.contains(CommandKind::Message, "info"));
    }

    #[test]
    fn unregister_returns_the_command() {
        let mut registry = CommandRegistry::new();
        registry.register(command("ping")).expect("registers");
        let removed = registry
            .unregister(CommandKind::ChatInput, "ping")
            .expect("present");
        assert_eq!(removed.name(), "ping");
        let error = registry
            .unregister(CommandKind::ChatInput, "ping")
            .expect_err("already gone");
        assert!(matches!(error.kind(), GiottoErrorKind::Registry(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn registration_binds_leaf_options() {
        use crate::handler::{FnCommandHandler, ParameterSpec};
        use giotto_model::OptionKind;

        let handler = Arc::new(
            FnCommandHandler::new(|_ctx| async move { Ok(()) })
                .with_parameters(vec![ParameterSpec::required("query", OptionKind::String)]),
        );
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandBuilder::new("search", handler).build().expect("builds"))
            .expect("registers");
        let stored = registry
            .get(CommandKind::ChatInput, "search")
            .expect("present");
        let model = stored.to_model();
        assert_eq!(model.options().len(), 1);
        assert_eq!(model.options()[0].name(), "query");
        assert!(model.options()[0].required());
    }
}
