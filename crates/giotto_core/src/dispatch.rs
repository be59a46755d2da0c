//! The dispatch engine.
//!
//! [`DispatchCore`] owns the command and component registries, the global
//! check list, and the synchronizer, and routes each inbound interaction to
//! the matching handlers. Processing never returns an error to the caller;
//! every outcome is reported through the configured [`EventSink`] and the
//! structured log.

use crate::check::CheckList;
use crate::command::{Command, CommandBody};
use crate::component::{ComponentBinding, ComponentRegistry};
use crate::config::DispatchConfig;
use crate::context::{CommandContext, ComponentContext};
use crate::event::{DispatchEvent, EventSink, NullSink};
use crate::group::InteractionGroup;
use crate::handler::CommandHandler;
use crate::registry::CommandRegistry;
use crate::sync::{RemoteCommandApi, Synchronizer};
use giotto_error::{DispatchError, DispatchErrorKind, GiottoError, GiottoResult};
use giotto_model::{
    CommandData, CommandKind, CommandOption, DataOption, InteractionKind, InteractionPayload,
    OptionValue,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Interaction dispatch core.
///
/// Registration and sync mutate the core; [`DispatchCore::process`] takes a
/// shared reference so the embedder can feed it from concurrent transport
/// tasks once setup is done.
pub struct DispatchCore {
    config: DispatchConfig,
    commands: CommandRegistry,
    components: Arc<ComponentRegistry>,
    checks: CheckList,
    sink: Arc<dyn EventSink>,
    sync: Synchronizer,
}

impl std::fmt::Debug for DispatchCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCore")
            .field("config", &self.config)
            .field("commands", &self.commands.len())
            .field("sync", &self.sync)
            .finish()
    }
}

impl DispatchCore {
    /// Create a core with the given configuration and no event sink.
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            commands: CommandRegistry::new(),
            components: Arc::new(ComponentRegistry::new()),
            checks: CheckList::new(),
            sink: Arc::new(NullSink),
            sync: Synchronizer::new(),
        }
    }

    /// Attach an event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The local command registry.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The component registry, shared for `wait_for` callers.
    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    /// Checks applied to every command and component interaction.
    pub fn global_checks(&self) -> &CheckList {
        &self.checks
    }

    /// Mutable access to the global check list.
    pub fn global_checks_mut(&mut self) -> &mut CheckList {
        &mut self.checks
    }

    fn sync_enabled(&self, command: &Command) -> bool {
        command
            .sync_policy()
            .unwrap_or(*self.config.global_sync_command())
    }

    /// Register a command, queuing a remote sync when its policy calls for
    /// one.
    #[instrument(skip(self, command), fields(name = command.name()))]
    pub fn register_command(&mut self, command: Command) -> GiottoResult<()> {
        let queue = self.sync_enabled(&command);
        let kind = command.kind();
        let name = command.name().to_string();
        self.commands.register(command)?;
        if queue {
            self.sync.queue_register(kind, name);
        }
        Ok(())
    }

    /// Unregister a command, queuing a remote removal when its policy calls
    /// for one.
    #[instrument(skip(self))]
    pub fn unregister_command(&mut self, kind: CommandKind, name: &str) -> GiottoResult<()> {
        let command = self.commands.unregister(kind, name)?;
        if self.sync_enabled(&command) {
            self.sync.queue_delete(command.to_model());
        }
        Ok(())
    }

    /// Register every command and component binding in a group.
    ///
    /// Commands are tagged with the group's name. Registration stops at the
    /// first failure; earlier registrations stay in place.
    #[instrument(skip(self, group), fields(group = group.name()))]
    pub fn add_group(&mut self, group: InteractionGroup) -> GiottoResult<()> {
        let (name, commands, components) = group.into_parts();
        for mut command in commands {
            command.set_group(name.clone());
            self.register_command(command)?;
        }
        for binding in components {
            self.components.bind(binding);
        }
        Ok(())
    }

    /// Add a persistent component binding.
    pub fn bind_component(&self, binding: ComponentBinding) {
        self.components.bind(binding);
    }

    /// Remove every binding under a custom id.
    pub fn unbind_component(&self, custom_id: &str) -> usize {
        self.components.unbind(custom_id)
    }

    /// Ready-time sync pass: flush queued registrations and removals, then
    /// run the one-shot stale sweep when global sync is enabled.
    pub async fn mark_ready(&mut self, api: &dyn RemoteCommandApi) -> GiottoResult<()> {
        let application_id = *self.config.application_id();
        let global_sync = *self.config.global_sync_command();
        self.sync
            .ready(api, application_id, &mut self.commands, global_sync)
            .await
    }

    /// Force one command through a remote sync immediately.
    pub async fn sync_command(
        &mut self,
        api: &dyn RemoteCommandApi,
        kind: CommandKind,
        name: &str,
    ) -> GiottoResult<()> {
        let application_id = *self.config.application_id();
        let command = self
            .commands
            .get_mut(kind, name)
            .ok_or_else(|| giotto_error::RegistryError::not_found(name))?;
        self.sync.sync_command(api, application_id, command).await
    }

    /// Drop the cached remote command list.
    pub fn invalidate_sync_cache(&mut self) {
        self.sync.invalidate_cache();
    }

    /// Route one inbound interaction.
    ///
    /// Outcomes are reported through the event sink; unknown commands and
    /// liveness pings are dropped with a log line.
    #[instrument(skip(self, payload), fields(id = payload.id(), kind = %payload.kind()))]
    pub async fn process(&self, payload: InteractionPayload) {
        match payload.kind() {
            InteractionKind::Ping => trace!("liveness ping ignored"),
            InteractionKind::ApplicationCommand => self.process_command(payload).await,
            InteractionKind::Component => self.process_component(payload).await,
            InteractionKind::Autocomplete => self.process_autocomplete(payload).await,
            InteractionKind::ModalSubmit => self.process_modal(payload).await,
        }
    }

    async fn process_command(&self, payload: InteractionPayload) {
        let data = match payload.command_data() {
            Ok(data) => data,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let Some(command) = self.commands.get(*data.kind(), data.name()) else {
            debug!(name = data.name(), "no command registered for interaction");
            return;
        };

        let resolved = match resolve(command, &data) {
            Ok(resolved) => resolved,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let ctx = CommandContext::new(
            payload,
            command.name().to_string(),
            resolved.path,
            resolved.args,
            command.group().map(str::to_string),
        );
        self.sink
            .emit(DispatchEvent::CommandReceived(ctx.clone()))
            .await;

        let mut gates = vec![&self.checks, command.checks()];
        gates.extend(resolved.checks);
        for gate in gates {
            if let Err(failure) = gate.run(ctx.payload()).await {
                let error = GiottoError::from(failure);
                debug!(command = %ctx.qualified_name(), "command rejected by checks");
                self.sink
                    .emit(DispatchEvent::PermissionDenied {
                        ctx: ctx.clone(),
                        error: error.clone(),
                    })
                    .await;
                self.report(ctx.payload().clone(), error).await;
                return;
            }
        }

        match resolved.handler.invoke(ctx.clone()).await {
            Ok(()) => {
                debug!(command = %ctx.qualified_name(), "command handler complete");
                self.sink.emit(DispatchEvent::CommandComplete(ctx)).await;
            }
            Err(error) => {
                warn!(command = %ctx.qualified_name(), %error, "command handler failed");
                if error.is_check_failure() {
                    self.sink
                        .emit(DispatchEvent::PermissionDenied {
                            ctx: ctx.clone(),
                            error: error.clone(),
                        })
                        .await;
                }
                self.report(ctx.payload().clone(), error).await;
            }
        }
    }

    async fn process_component(&self, payload: InteractionPayload) {
        let data = match payload.component_data() {
            Ok(data) => data,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let ctx = ComponentContext::new(payload, data);

        let mut executed = 0usize;
        for binding in self.components.bindings_for(ctx.custom_id()) {
            if !binding.accepts(ctx.component_kind()) {
                continue;
            }
            let gate = async {
                self.checks.run(ctx.payload()).await?;
                binding.checks().run(ctx.payload()).await?;
                Ok::<(), giotto_error::CheckFailure>(())
            };
            if let Err(failure) = gate.await {
                debug!(custom_id = ctx.custom_id(), "component rejected by checks");
                let error = GiottoError::from(failure);
                self.sink
                    .emit(DispatchEvent::ComponentDenied {
                        ctx: ctx.clone(),
                        error: error.clone(),
                    })
                    .await;
                self.report(ctx.payload().clone(), error).await;
                continue;
            }
            executed += 1;
            match binding.handler().invoke(ctx.clone()).await {
                Ok(()) => {
                    self.sink
                        .emit(DispatchEvent::ComponentComplete(ctx.clone()))
                        .await;
                }
                Err(error) => {
                    warn!(custom_id = ctx.custom_id(), %error, "component handler failed");
                    self.report(ctx.payload().clone(), error).await;
                }
            }
        }

        let fulfilled = self.components.scan_waiters(&ctx);
        if executed == 0 && fulfilled == 0 {
            debug!(custom_id = ctx.custom_id(), "component event unhandled");
            self.sink
                .emit(DispatchEvent::ComponentsUnhandled(ctx))
                .await;
        }
    }

    async fn process_autocomplete(&self, payload: InteractionPayload) {
        let data = match payload.command_data() {
            Ok(data) => data,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let Some(command) = self.commands.get(*data.kind(), data.name()) else {
            debug!(name = data.name(), "no command registered for autocomplete");
            return;
        };
        let resolved = match resolve(command, &data) {
            Ok(resolved) => resolved,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let focused = data.focused_options();
        let ctx = CommandContext::new(
            payload,
            command.name().to_string(),
            resolved.path,
            resolved.args,
            command.group().map(str::to_string),
        );
        self.sink
            .emit(DispatchEvent::Autocomplete { ctx, focused })
            .await;
    }

    async fn process_modal(&self, payload: InteractionPayload) {
        let data = match payload.modal_data() {
            Ok(data) => data,
            Err(error) => {
                self.report(payload, error).await;
                return;
            }
        };
        let custom_id = data.custom_id().clone();
        let inputs = data.inputs();
        self.sink
            .emit(DispatchEvent::ModalSubmit {
                payload,
                custom_id,
                inputs,
            })
            .await;
    }

    async fn report(&self, payload: InteractionPayload, error: GiottoError) {
        self.sink.emit(DispatchEvent::Error { payload, error }).await;
    }
}

struct Resolved<'a> {
    path: Vec<String>,
    handler: &'a Arc<dyn CommandHandler>,
    checks: Vec<&'a CheckList>,
    args: HashMap<String, OptionValue>,
}

/// Walk the supplied option tree down to the invokable leaf, collecting the
/// subcommand path, the leaf's check lists, and the remapped argument map.
fn resolve<'a>(command: &'a Command, data: &CommandData) -> GiottoResult<Resolved<'a>> {
    match command.body() {
        CommandBody::Leaf { options, handler } => Ok(Resolved {
            path: Vec::new(),
            handler,
            checks: Vec::new(),
            args: build_args(options, data.options()),
        }),
        CommandBody::Subcommands(subcommands) => {
            let node = data.subcommand().ok_or_else(|| {
                DispatchError::new(DispatchErrorKind::MalformedPayload(format!(
                    "command '{}' takes subcommands but none was supplied",
                    command.name()
                )))
            })?;
            let sub = subcommands
                .iter()
                .find(|sub| sub.name() == node.name())
                .ok_or_else(|| unknown_path(command.name(), node.name()))?;
            Ok(Resolved {
                path: vec![sub.name().to_string()],
                handler: sub.handler(),
                checks: vec![sub.checks()],
                args: build_args(sub.options(), node.options()),
            })
        }
        CommandBody::Groups(groups) => {
            let group_node = data.subcommand_group().ok_or_else(|| {
                DispatchError::new(DispatchErrorKind::MalformedPayload(format!(
                    "command '{}' takes subcommand groups but none was supplied",
                    command.name()
                )))
            })?;
            let group = groups
                .iter()
                .find(|group| group.name() == group_node.name())
                .ok_or_else(|| unknown_path(command.name(), group_node.name()))?;
            let sub_node = group_node.subcommand().ok_or_else(|| {
                DispatchError::new(DispatchErrorKind::MalformedPayload(format!(
                    "group '{}' of command '{}' carried no subcommand",
                    group.name(),
                    command.name()
                )))
            })?;
            let sub = group.subcommand(sub_node.name()).ok_or_else(|| {
                unknown_path(command.name(), format!("{} {}", group.name(), sub_node.name()))
            })?;
            Ok(Resolved {
                path: vec![group.name().to_string(), sub.name().to_string()],
                handler: sub.handler(),
                checks: vec![sub.checks()],
                args: build_args(sub.options(), sub_node.options()),
            })
        }
    }
}

fn unknown_path(command: &str, path: impl Into<String>) -> GiottoError {
    DispatchError::new(DispatchErrorKind::UnknownSubcommand {
        command: command.to_string(),
        path: path.into(),
    })
    .into()
}

/// Key each supplied value by its declared option's binding; options the
/// command never declared keep their own name.
fn build_args(
    declared: &[CommandOption],
    supplied: &[DataOption],
) -> HashMap<String, OptionValue> {
    let mut args = HashMap::with_capacity(supplied.len());
    for option in supplied {
        let key = declared
            .iter()
            .find(|decl| decl.name() == option.name())
            .map(|decl| decl.binding().to_string())
            .unwrap_or_else(|| option.name().clone());
        args.insert(key, option.decoded_value());
    }
    args
}
