//! Remote command synchronization.
//!
//! The synchronizer reconciles locally registered commands against the
//! remote command list through a transport-agnostic API seam. The remote
//! list is fetched once and cached; create/update/delete mutate the cache
//! in place so one sync pass observes its own writes.

use crate::command::Command;
use crate::registry::CommandRegistry;
use async_trait::async_trait;
use giotto_error::{GiottoResult, RegistryError, SyncError, SyncErrorKind};
use giotto_model::{ApplicationCommand, CommandKind};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, instrument, warn};

/// Transport seam for the remote application command API.
///
/// Payloads are the registration wire shape produced by
/// [`ApplicationCommand::to_register_value`]; create and update return the
/// server echo, which carries the assigned id.
#[async_trait]
pub trait RemoteCommandApi: Send + Sync {
    /// List every registered remote command.
    async fn list_commands(&self, application_id: u64) -> GiottoResult<Vec<serde_json::Value>>;

    /// Create a remote command, returning the server echo.
    async fn create_command(
        &self,
        application_id: u64,
        payload: serde_json::Value,
    ) -> GiottoResult<serde_json::Value>;

    /// Overwrite a remote command, returning the server echo.
    async fn update_command(
        &self,
        application_id: u64,
        command_id: u64,
        payload: serde_json::Value,
    ) -> GiottoResult<serde_json::Value>;

    /// Delete a remote command.
    async fn delete_command(&self, application_id: u64, command_id: u64) -> GiottoResult<()>;
}

type Snapshot = [HashMap<String, ApplicationCommand>; 3];

/// Reconciles local commands against the remote command list.
///
/// Registrations and removals that happen before the transport is ready are
/// queued and drained in FIFO order by [`Synchronizer::flush`].
#[derive(Default)]
pub struct Synchronizer {
    snapshot: Option<Snapshot>,
    register_queue: VecDeque<(CommandKind, String)>,
    delete_queue: VecDeque<ApplicationCommand>,
    swept: bool,
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("cached", &self.snapshot.is_some())
            .field("queued_registers", &self.register_queue.len())
            .field("queued_deletes", &self.delete_queue.len())
            .field("swept", &self.swept)
            .finish()
    }
}

impl Synchronizer {
    /// Create a synchronizer with no cached snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command for sync on the next flush.
    pub fn queue_register(&mut self, kind: CommandKind, name: impl Into<String>) {
        self.register_queue.push_back((kind, name.into()));
    }

    /// Queue a remote removal for the next flush.
    pub fn queue_delete(&mut self, model: ApplicationCommand) {
        self.delete_queue.push_back(model);
    }

    /// Number of queued register and delete entries.
    pub fn queued(&self) -> usize {
        self.register_queue.len() + self.delete_queue.len()
    }

    /// Drop the cached remote snapshot so the next sync refetches it.
    pub fn invalidate_cache(&mut self) {
        self.snapshot = None;
    }

    async fn snapshot_mut(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
    ) -> GiottoResult<&mut Snapshot> {
        if self.snapshot.is_none() {
            let listed = api.list_commands(application_id).await?;
            let mut maps = Snapshot::default();
            for value in &listed {
                let remote = ApplicationCommand::from_payload(value)?;
                maps[remote.kind().index()].insert(remote.name().clone(), remote);
            }
            info!(commands = listed.len(), "remote command list cached");
            self.snapshot = Some(maps);
        }
        Ok(self.snapshot.get_or_insert_with(Snapshot::default))
    }

    /// Reconcile one command against the remote list.
    ///
    /// A remote entry with the same name assigns its id locally and is
    /// overwritten only when structurally unequal; a missing entry is
    /// created and the echoed id is assigned. Equal commands make zero
    /// remote calls beyond the cached list fetch.
    #[instrument(skip(self, api, command), fields(name = command.name()))]
    pub async fn sync_command(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
        command: &mut Command,
    ) -> GiottoResult<()> {
        let mut desired = command.to_model();
        let cache = self.snapshot_mut(api, application_id).await?;
        let namespace = &mut cache[desired.kind().index()];

        match namespace.get(desired.name()) {
            Some(remote) => {
                let id = *remote.id();
                command.assign_id(id);
                desired.assign_id(id);
                if desired != *remote {
                    debug!(id, "remote command out of date, overwriting");
                    api.update_command(application_id, id, desired.to_register_value())
                        .await?;
                    namespace.insert(desired.name().clone(), desired);
                } else {
                    debug!(id, "remote command up to date");
                }
            }
            None => {
                let echo = api
                    .create_command(application_id, desired.to_register_value())
                    .await?;
                let created = ApplicationCommand::from_payload(&echo)?;
                if !created.has_id() {
                    return Err(SyncError::new(SyncErrorKind::MalformedSnapshot(
                        "create echo carried no command id".to_string(),
                    ))
                    .into());
                }
                debug!(id = created.id(), "remote command created");
                command.assign_id(*created.id());
                namespace.insert(created.name().clone(), created);
            }
        }
        Ok(())
    }

    /// Remove a command's remote registration.
    ///
    /// The command must exist in the remote list; deleting an unknown name
    /// is a registry error.
    #[instrument(skip(self, api, model), fields(name = model.name()))]
    pub async fn sync_delete(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
        model: &ApplicationCommand,
    ) -> GiottoResult<()> {
        let cache = self.snapshot_mut(api, application_id).await?;
        let namespace = &mut cache[model.kind().index()];
        let Some(remote) = namespace.get(model.name()) else {
            return Err(RegistryError::not_found(model.name()).into());
        };
        let id = *remote.id();
        api.delete_command(application_id, id).await?;
        namespace.remove(model.name());
        debug!(id, "remote command deleted");
        Ok(())
    }

    /// Drain the queued registers, then the queued deletes, in FIFO order.
    #[instrument(skip_all)]
    pub async fn flush(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
        registry: &mut CommandRegistry,
    ) -> GiottoResult<()> {
        while let Some((kind, name)) = self.register_queue.pop_front() {
            match registry.get_mut(kind, &name) {
                Some(command) => {
                    self.sync_command(api, application_id, command).await?;
                }
                None => {
                    warn!(name, "queued command unregistered before flush");
                }
            }
        }
        while let Some(model) = self.delete_queue.pop_front() {
            self.sync_delete(api, application_id, &model).await?;
        }
        Ok(())
    }

    /// Delete every remote command with no local counterpart.
    ///
    /// Failures are logged and skipped so one stubborn command does not
    /// block the rest of the sweep. Returns the number of deletions.
    #[instrument(skip(self, api, registry))]
    pub async fn sweep(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
        registry: &CommandRegistry,
    ) -> GiottoResult<usize> {
        let cache = self.snapshot_mut(api, application_id).await?;
        let mut stale = Vec::new();
        for (index, namespace) in cache.iter().enumerate() {
            for (name, remote) in namespace {
                let kind = *remote.kind();
                debug_assert_eq!(kind.index(), index);
                if !registry.contains(kind, name) {
                    stale.push((kind, name.clone(), *remote.id()));
                }
            }
        }

        let mut deleted = 0;
        for (kind, name, id) in stale {
            match api.delete_command(application_id, id).await {
                Ok(()) => {
                    if let Some(cache) = self.snapshot.as_mut() {
                        cache[kind.index()].remove(&name);
                    }
                    info!(name, id, "stale remote command removed");
                    deleted += 1;
                }
                Err(error) => {
                    warn!(name, id, %error, "failed to remove stale remote command");
                }
            }
        }
        Ok(deleted)
    }

    /// Ready-time pass: flush the queues, then run the one-shot stale sweep
    /// when global sync is enabled. The sweep runs at most once per
    /// synchronizer lifetime.
    pub async fn ready(
        &mut self,
        api: &dyn RemoteCommandApi,
        application_id: u64,
        registry: &mut CommandRegistry,
        global_sync: bool,
    ) -> GiottoResult<()> {
        self.flush(api, application_id, registry).await?;
        if global_sync && !self.swept {
            self.swept = true;
            self.sweep(api, application_id, registry).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;
    use crate::handler::command_handler;
    use giotto_model::{CommandOption, OptionKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    struct MockApi {
        remote: Vec<serde_json::Value>,
        calls: Mutex<Vec<String>>,
        next_id: AtomicU64,
    }

    impl MockApi {
        fn new(remote: Vec<serde_json::Value>) -> Self {
            Self {
                remote,
                calls: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(9000),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl RemoteCommandApi for MockApi {
        async fn list_commands(&self, _app: u64) -> GiottoResult<Vec<serde_json::Value>> {
            self.calls.lock().expect("calls lock").push("list".into());
            Ok(self.remote.clone())
        }

        async fn create_command(
            &self,
            _app: u64,
            payload: serde_json::Value,
        ) -> GiottoResult<serde_json::Value> {
            let name = payload["name"].as_str().unwrap_or("?").to_string();
            self.calls
                .lock()
                .expect("calls lock")
                .push(format!("create:{name}"));
            let mut echo = payload;
            echo["id"] = json!(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
            Ok(echo)
        }

        async fn update_command(
            &self,
            _app: u64,
            command_id: u64,
            payload: serde_json::Value,
        ) -> GiottoResult<serde_json::Value> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(format!("update:{command_id}"));
            let mut echo = payload;
            echo["id"] = json!(command_id.to_string());
            Ok(echo)
        }

        async fn delete_command(&self, _app: u64, command_id: u64) -> GiottoResult<()> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(format!("delete:{command_id}"));
            Ok(())
        }
    }

    fn play_command() -> Command {
        CommandBuilder::new("play", command_handler(|_ctx| async move { Ok(()) }))
            .description("Play a song")
            .option(CommandOption::new("title", OptionKind::String).with_required(true))
            .build()
            .expect("builds")
    }

    fn remote_play(id: &str, description: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "play",
            "description": description,
            "type": 1,
            "options": [{"name": "title", "type": 3, "required": true}]
        })
    }

    #[tokio::test]
    async fn missing_remote_command_created_once() {
        let api = MockApi::new(vec![]);
        let mut sync = Synchronizer::new();
        let mut command = play_command();
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list", "create:play"]);
        assert_eq!(command.id(), 9000);

        // Second pass hits the mutated cache and makes no further calls.
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list", "create:play"]);
    }

    #[tokio::test]
    async fn equal_remote_command_only_assigns_id() {
        let api = MockApi::new(vec![remote_play("777", "Play a song")]);
        let mut sync = Synchronizer::new();
        let mut command = play_command();
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list"]);
        assert_eq!(command.id(), 777);
    }

    #[tokio::test]
    async fn unequal_remote_command_updated_once() {
        let api = MockApi::new(vec![remote_play("777", "Old description")]);
        let mut sync = Synchronizer::new();
        let mut command = play_command();
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list", "update:777"]);
        assert_eq!(command.id(), 777);

        // The cache now holds the overwritten shape, so a repeat is a no-op.
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list", "update:777"]);
    }

    #[tokio::test]
    async fn delete_of_unknown_remote_name_is_an_error() {
        let api = MockApi::new(vec![]);
        let mut sync = Synchronizer::new();
        let model = play_command().to_model();
        let error = sync.sync_delete(&api, 1, &model).await.expect_err("unknown");
        assert!(matches!(
            error.kind(),
            giotto_error::GiottoErrorKind::Registry(_)
        ));
        assert_eq!(api.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn invalidate_cache_forces_refetch() {
        let api = MockApi::new(vec![remote_play("777", "Play a song")]);
        let mut sync = Synchronizer::new();
        let mut command = play_command();
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        sync.invalidate_cache();
        sync.sync_command(&api, 1, &mut command).await.expect("syncs");
        assert_eq!(api.calls(), vec!["list", "list"]);
    }

    #[tokio::test]
    async fn sweep_deletes_exactly_the_unregistered_names() {
        let api = MockApi::new(vec![
            remote_play("777", "Play a song"),
            json!({"id": "888", "name": "legacy", "description": "gone", "type": 1}),
        ]);
        let mut sync = Synchronizer::new();
        let mut registry = CommandRegistry::new();
        registry.register(play_command()).expect("registers");
        let deleted = sync.sweep(&api, 1, &registry).await.expect("sweeps");
        assert_eq!(deleted, 1);
        assert_eq!(api.calls(), vec!["list", "delete:888"]);
    }

    #[tokio::test]
    async fn flush_drains_registers_before_deletes() {
        let api = MockApi::new(vec![json!({
            "id": "888", "name": "legacy", "description": "gone", "type": 1
        })]);
        let mut sync = Synchronizer::new();
        let mut registry = CommandRegistry::new();
        registry.register(play_command()).expect("registers");

        // Deletes queued earlier still wait for every pending register.
        sync.queue_delete(ApplicationCommand::new("legacy", "gone", CommandKind::ChatInput));
        sync.queue_register(CommandKind::ChatInput, "play");
        assert_eq!(sync.queued(), 2);

        sync.flush(&api, 1, &mut registry).await.expect("flushes");
        assert_eq!(api.calls(), vec!["list", "create:play", "delete:888"]);
        assert_eq!(sync.queued(), 0);
    }

    #[tokio::test]
    async fn ready_flushes_queues_then_sweeps_once() {
        let api = MockApi::new(vec![json!({
            "id": "888", "name": "legacy", "description": "gone", "type": 1
        })]);
        let mut sync = Synchronizer::new();
        let mut registry = CommandRegistry::new();
        registry.register(play_command()).expect("registers");
        sync.queue_register(CommandKind::ChatInput, "play");

        sync.ready(&api, 1, &mut registry, true).await.expect("ready");
        assert_eq!(api.calls(), vec!["list", "create:play", "delete:888"]);
        let synced = registry
            .get(CommandKind::ChatInput, "play")
            .expect("still registered");
        assert_eq!(synced.id(), 9000);

        // The sweep is one-shot; a second ready pass only flushes.
        sync.ready(&api, 1, &mut registry, true).await.expect("ready");
        assert_eq!(api.calls(), vec!["list", "create:play", "delete:888"]);
    }
}
