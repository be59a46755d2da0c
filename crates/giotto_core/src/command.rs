//! Registered command values and their builders.
//!
//! A [`Command`] composes the declared data shape (serialized for
//! registration and diffed during sync) with the handler topology and the
//! ordered check lists gating execution. Subtypes are a tagged variant, not
//! a hierarchy: one shared struct holds id/name/description/checks and
//! [`CommandBody`] carries what differs per kind.

use crate::check::{CheckList, CheckPredicate};
use crate::handler::CommandHandler;
use giotto_error::{GiottoResult, RegistryError};
use giotto_model::{ApplicationCommand, CommandKind, CommandOption, OptionKind};
use std::fmt;
use std::sync::Arc;

/// Kind-specific body of a command.
pub enum CommandBody {
    /// A directly-invokable command: plain slash command (with leaf
    /// options), user command or context-menu command (no options).
    Leaf {
        /// Declared leaf options; empty for user/context-menu commands.
        options: Vec<CommandOption>,
        /// The handler invoked at dispatch time.
        handler: Arc<dyn CommandHandler>,
    },
    /// A slash command whose children are subcommand groups.
    Groups(Vec<SubcommandGroup>),
    /// A slash command whose children are subcommands.
    Subcommands(Vec<Subcommand>),
}

impl fmt::Debug for CommandBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandBody::Leaf { options, .. } => f
                .debug_struct("Leaf")
                .field("options", &options.len())
                .finish(),
            CommandBody::Groups(groups) => f.debug_tuple("Groups").field(&groups.len()).finish(),
            CommandBody::Subcommands(subs) => {
                f.debug_tuple("Subcommands").field(&subs.len()).finish()
            }
        }
    }
}

/// One leaf subcommand.
pub struct Subcommand {
    name: String,
    description: String,
    options: Vec<CommandOption>,
    handler: Arc<dyn CommandHandler>,
    checks: CheckList,
}

impl fmt::Debug for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subcommand")
            .field("name", &self.name)
            .field("options", &self.options.len())
            .finish()
    }
}

impl Subcommand {
    /// Subcommand name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subcommand description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared leaf options.
    pub fn options(&self) -> &[CommandOption] {
        &self.options
    }

    /// The handler invoked when this leaf is resolved.
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Checks gating this leaf.
    pub fn checks(&self) -> &CheckList {
        &self.checks
    }

    pub(crate) fn bind(&mut self, command: &str) -> GiottoResult<()> {
        bind_options(command, &mut self.options, self.handler.as_ref())
    }

    fn to_option(&self) -> CommandOption {
        CommandOption::new(self.name.clone(), OptionKind::SubCommand)
            .with_description(self.description.clone())
            .with_options(self.options.clone())
    }
}

/// One subcommand group holding leaf subcommands.
#[derive(Debug)]
pub struct SubcommandGroup {
    name: String,
    description: String,
    subcommands: Vec<Subcommand>,
}

impl SubcommandGroup {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The leaf subcommands, in declaration order.
    pub fn subcommands(&self) -> &[Subcommand] {
        &self.subcommands
    }

    /// Find a leaf subcommand by name.
    pub fn subcommand(&self, name: &str) -> Option<&Subcommand> {
        self.subcommands.iter().find(|sub| sub.name == name)
    }

    fn to_option(&self) -> CommandOption {
        CommandOption::new(self.name.clone(), OptionKind::SubCommandGroup)
            .with_description(self.description.clone())
            .with_options(self.subcommands.iter().map(Subcommand::to_option).collect())
    }
}

/// One registered command: declared shape plus handler topology and checks.
#[derive(Debug)]
pub struct Command {
    name: String,
    description: String,
    kind: CommandKind,
    id: u64,
    body: CommandBody,
    checks: CheckList,
    sync_policy: Option<bool>,
    group: Option<String>,
    default_member_permissions: Option<u64>,
    dm_permission: Option<bool>,
}

impl Command {
    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Command kind, selecting the registry namespace.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Remote id; `0` until a sync learns it.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Record the remote id once a sync learns it.
    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    /// Kind-specific body.
    pub fn body(&self) -> &CommandBody {
        &self.body
    }

    /// Checks gating the root command.
    pub fn checks(&self) -> &CheckList {
        &self.checks
    }

    /// Mutable access to the root check list.
    pub fn checks_mut(&mut self) -> &mut CheckList {
        &mut self.checks
    }

    /// Per-command sync override; `None` defers to the core configuration.
    pub fn sync_policy(&self) -> Option<bool> {
        self.sync_policy
    }

    /// Owning group name, if registered through a group.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub(crate) fn set_group(&mut self, group: impl Into<String>) {
        self.group = Some(group.into());
    }

    /// Whether the body nests subcommands or groups.
    pub fn is_subcommand_container(&self) -> bool {
        matches!(
            self.body,
            CommandBody::Groups(_) | CommandBody::Subcommands(_)
        )
    }

    /// Build the data model used for wire registration and sync diffing.
    pub fn to_model(&self) -> ApplicationCommand {
        let options = match &self.body {
            CommandBody::Leaf { options, .. } => options.clone(),
            CommandBody::Groups(groups) => {
                groups.iter().map(SubcommandGroup::to_option).collect()
            }
            CommandBody::Subcommands(subs) => subs.iter().map(Subcommand::to_option).collect(),
        };
        let mut model =
            ApplicationCommand::new(self.name.clone(), self.description.clone(), self.kind)
                .with_options(options);
        if let Some(bits) = self.default_member_permissions {
            model = model.with_default_member_permissions(bits);
        }
        if let Some(allowed) = self.dm_permission {
            model = model.with_dm_permission(allowed);
        }
        if self.id != 0 {
            model.assign_id(self.id);
        }
        model
    }

    /// Walk the body and bind every leaf's options against its handler's
    /// declared parameters. Idempotent; run by the registry at registration
    /// time.
    pub(crate) fn bind_handler_parameters(&mut self) -> GiottoResult<()> {
        let command = self.name.clone();
        match &mut self.body {
            CommandBody::Leaf { options, handler } => {
                bind_options(&command, options, handler.as_ref())
            }
            CommandBody::Subcommands(subs) => {
                for sub in subs {
                    sub.bind(&command)?;
                }
                Ok(())
            }
            CommandBody::Groups(groups) => {
                for group in groups {
                    for sub in &mut group.subcommands {
                        sub.bind(&command)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Reconcile a declared option list against a handler's parameter list.
///
/// When the handler declares no parameters the options stand as authored.
/// Otherwise every parameter must have a corresponding option (placeholders
/// are auto-filled from the parameter spec) and surplus options are an
/// `InvalidOptionConfiguration`. Parameters without a default force their
/// option required, and unbound options take their parameter's name.
fn bind_options(
    command: &str,
    options: &mut Vec<CommandOption>,
    handler: &dyn CommandHandler,
) -> GiottoResult<()> {
    let Some(parameters) = handler.parameters() else {
        return Ok(());
    };

    if options.len() > parameters.len() {
        return Err(RegistryError::invalid_options(
            command,
            format!(
                "{} options declared for {} handler parameters",
                options.len(),
                parameters.len()
            ),
        )
        .into());
    }
    for parameter in parameters.iter().skip(options.len()) {
        options.push(CommandOption::placeholder(
            parameter.name().clone(),
            *parameter.kind(),
        ));
    }
    for (option, parameter) in options.iter_mut().zip(parameters.iter()) {
        if option.parameter_name().is_none() {
            option.bind_parameter(parameter.name().clone());
        }
        if *parameter.is_required() {
            option.set_required(true);
        }
    }
    Ok(())
}

/// Builder for slash commands.
///
/// Options, subcommands and groups are mutually exclusive on one root:
/// `build` rejects mixed children with `InvalidOptionConfiguration`.
pub struct CommandBuilder {
    name: String,
    description: String,
    handler: Option<Arc<dyn CommandHandler>>,
    options: Vec<CommandOption>,
    subcommands: Vec<Subcommand>,
    groups: Vec<SubcommandGroup>,
    checks: CheckList,
    sync_policy: Option<bool>,
    default_member_permissions: Option<u64>,
    dm_permission: Option<bool>,
}

impl CommandBuilder {
    /// Start a slash command with a directly-invoked handler.
    pub fn new(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            description: "No description.".to_string(),
            handler: Some(handler),
            options: Vec::new(),
            subcommands: Vec::new(),
            groups: Vec::new(),
            checks: CheckList::new(),
            sync_policy: None,
            default_member_permissions: None,
            dm_permission: None,
        }
    }

    /// Start a slash command that only exists as a subcommand container.
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "No description.".to_string(),
            handler: None,
            options: Vec::new(),
            subcommands: Vec::new(),
            groups: Vec::new(),
            checks: CheckList::new(),
            sync_policy: None,
            default_member_permissions: None,
            dm_permission: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a leaf option.
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Append a subcommand.
    pub fn subcommand(mut self, subcommand: Subcommand) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Append a subcommand group.
    pub fn group(mut self, group: SubcommandGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Append a root check.
    pub fn check(mut self, check: CheckPredicate) -> Self {
        self.checks.add(check);
        self
    }

    /// Override the sync policy for this command.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync_policy = Some(sync);
        self
    }

    /// Set default member permission bits.
    pub fn default_member_permissions(mut self, bits: u64) -> Self {
        self.default_member_permissions = Some(bits);
        self
    }

    /// Set DM availability.
    pub fn dm_permission(mut self, allowed: bool) -> Self {
        self.dm_permission = Some(allowed);
        self
    }

    /// Validate and build the command.
    pub fn build(self) -> GiottoResult<Command> {
        let populated = usize::from(!self.options.is_empty())
            + usize::from(!self.subcommands.is_empty())
            + usize::from(!self.groups.is_empty());
        if populated > 1 {
            return Err(RegistryError::invalid_options(
                &self.name,
                "a root command mixes plain options with subcommands or groups",
            )
            .into());
        }

        let body = if !self.groups.is_empty() {
            CommandBody::Groups(self.groups)
        } else if !self.subcommands.is_empty() {
            CommandBody::Subcommands(self.subcommands)
        } else {
            let handler = self.handler.ok_or_else(|| {
                RegistryError::invalid_options(
                    &self.name,
                    "a command without subcommands needs a handler",
                )
            })?;
            CommandBody::Leaf {
                options: self.options,
                handler,
            }
        };

        let mut command = Command {
            name: self.name,
            description: self.description,
            kind: CommandKind::ChatInput,
            id: 0,
            body,
            checks: self.checks,
            sync_policy: self.sync_policy,
            group: None,
            default_member_permissions: self.default_member_permissions,
            dm_permission: self.dm_permission,
        };

        let model = command.to_model();
        for option in model.options() {
            option.validate(command.name())?;
        }
        if let Some(reason) = model.homogeneity_violation() {
            return Err(RegistryError::invalid_options(command.name(), reason).into());
        }
        command.bind_handler_parameters()?;
        Ok(command)
    }
}

/// Builder for leaf subcommands.
pub struct SubcommandBuilder {
    name: String,
    description: String,
    handler: Arc<dyn CommandHandler>,
    options: Vec<CommandOption>,
    checks: CheckList,
}

impl SubcommandBuilder {
    /// Start a subcommand.
    pub fn new(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            description: "No description.".to_string(),
            handler,
            options: Vec::new(),
            checks: CheckList::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a leaf option.
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Append a check gating this leaf.
    pub fn check(mut self, check: CheckPredicate) -> Self {
        self.checks.add(check);
        self
    }

    /// Build the subcommand.
    pub fn build(self) -> Subcommand {
        Subcommand {
            name: self.name,
            description: self.description,
            options: self.options,
            handler: self.handler,
            checks: self.checks,
        }
    }
}

/// Builder for subcommand groups.
pub struct GroupBuilder {
    name: String,
    description: String,
    subcommands: Vec<Subcommand>,
}

impl GroupBuilder {
    /// Start a group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "No description.".to_string(),
            subcommands: Vec::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a leaf subcommand.
    pub fn subcommand(mut self, subcommand: Subcommand) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Build the group.
    pub fn build(self) -> SubcommandGroup {
        SubcommandGroup {
            name: self.name,
            description: self.description,
            subcommands: self.subcommands,
        }
    }
}

impl Command {
    /// Build a user (member context menu) command.
    pub fn user(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: CommandKind::User,
            id: 0,
            body: CommandBody::Leaf {
                options: Vec::new(),
                handler,
            },
            checks: CheckList::new(),
            sync_policy: None,
            group: None,
            default_member_permissions: None,
            dm_permission: None,
        }
    }

    /// Build a message context-menu command.
    pub fn context_menu(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: CommandKind::Message,
            id: 0,
            body: CommandBody::Leaf {
                options: Vec::new(),
                handler,
            },
            checks: CheckList::new(),
            sync_policy: None,
            group: None,
            default_member_permissions: None,
            dm_permission: None,
        }
    }

    /// Override the sync policy for this command.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync_policy = Some(sync);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{command_handler, FnCommandHandler, ParameterSpec};

    fn noop() -> Arc<dyn CommandHandler> {
        command_handler(|_ctx| async move { Ok(()) })
    }

    #[test]
    fn mixed_children_rejected() {
        let result = CommandBuilder::new("admin", noop())
            .option(CommandOption::new("reason", OptionKind::String))
            .subcommand(SubcommandBuilder::new("ban", noop()).build())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn declared_parameters_auto_fill_placeholders() {
        let handler = Arc::new(
            FnCommandHandler::new(|_ctx| async move { Ok(()) }).with_parameters(vec![
                ParameterSpec::required("title", OptionKind::String),
                ParameterSpec::optional("volume", OptionKind::Integer),
            ]),
        );
        let command = CommandBuilder::new("play", handler)
            .option(CommandOption::new("title", OptionKind::String))
            .build()
            .expect("builds");
        match command.body() {
            CommandBody::Leaf { options, .. } => {
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].binding(), "title");
                assert!(options[0].required());
                assert_eq!(options[1].name(), "volume");
                assert_eq!(options[1].binding(), "volume");
                assert!(!options[1].required());
            }
            other => panic!("expected leaf body, got {other:?}"),
        }
    }

    #[test]
    fn surplus_options_rejected() {
        let handler = Arc::new(
            FnCommandHandler::new(|_ctx| async move { Ok(()) })
                .with_parameters(vec![ParameterSpec::required("one", OptionKind::String)]),
        );
        let result = CommandBuilder::new("play", handler)
            .option(CommandOption::new("one", OptionKind::String))
            .option(CommandOption::new("two", OptionKind::String))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn misplaced_numeric_constraint_rejected_at_build() {
        let result = CommandBuilder::new("play", noop())
            .option(CommandOption::new("title", OptionKind::String).with_min_value(1.0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn model_reflects_group_tree() {
        let command = CommandBuilder::container("settings")
            .description("Server settings")
            .group(
                GroupBuilder::new("audio")
                    .subcommand(
                        SubcommandBuilder::new("volume", noop())
                            .option(CommandOption::new("level", OptionKind::Integer))
                            .build(),
                    )
                    .build(),
            )
            .build()
            .expect("builds");
        let model = command.to_model();
        assert_eq!(model.options().len(), 1);
        let group = &model.options()[0];
        assert_eq!(*group.kind(), OptionKind::SubCommandGroup);
        assert_eq!(*group.options()[0].kind(), OptionKind::SubCommand);
        assert!(command.is_subcommand_container());
    }
}
