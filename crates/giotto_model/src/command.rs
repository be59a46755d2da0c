//! Application command model and registration wire format.

use crate::option::{CommandOption, OptionKind};
use giotto_error::{GiottoResult, SyncError, SyncErrorKind};
use serde::{Deserialize, Serialize};

/// Kind of an application command.
///
/// Wire values follow the Discord application command type table. The kind
/// also selects the registry namespace a command name is unique within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(try_from = "u8", into = "u8")]
pub enum CommandKind {
    /// Slash command (`/name ...`).
    ChatInput = 1,
    /// Command on a user context menu.
    User = 2,
    /// Command on a message context menu.
    Message = 3,
}

impl CommandKind {
    /// Namespace index for kind-partitioned registry maps.
    pub fn index(&self) -> usize {
        (*self as u8 - 1) as usize
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CommandKind::ChatInput),
            2 => Ok(CommandKind::User),
            3 => Ok(CommandKind::Message),
            other => Err(format!("unknown command kind: {other}")),
        }
    }
}

/// Declared shape of one application command, as registered with Discord.
///
/// The numeric `id` is assigned by Discord after registration and stays `0`
/// until a sync learns it. Structural equality (used for create/update
/// diffing) deliberately ignores the id.
#[derive(Debug, Clone, Serialize, Deserialize, derive_getters::Getters)]
pub struct ApplicationCommand {
    /// Remote command id; `0` until assigned by a sync.
    #[serde(default, with = "crate::serde_util::snowflake")]
    id: u64,
    /// Command name, unique per kind namespace.
    name: String,
    /// Command description. Context menu commands carry an empty one.
    #[serde(default)]
    description: String,
    /// Command kind.
    #[serde(rename = "type", default = "default_kind")]
    kind: CommandKind,
    /// Option tree. For slash commands this is either all leaf options, all
    /// subcommand groups, or all subcommands; never mixed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<CommandOption>,
    /// Default permission bits members need to see the command.
    #[serde(
        default,
        with = "crate::serde_util::permissions_opt",
        skip_serializing_if = "Option::is_none"
    )]
    default_member_permissions: Option<u64>,
    /// Whether the command is usable in direct messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dm_permission: Option<bool>,
}

fn default_kind() -> CommandKind {
    CommandKind::ChatInput
}

impl ApplicationCommand {
    /// Create a new command of the given kind with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            kind,
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: None,
        }
    }

    /// Replace the option tree.
    pub fn with_options(mut self, options: Vec<CommandOption>) -> Self {
        self.options = options;
        self
    }

    /// Set the default member permission bits.
    pub fn with_default_member_permissions(mut self, permissions: u64) -> Self {
        self.default_member_permissions = Some(permissions);
        self
    }

    /// Set whether the command is usable in DMs.
    pub fn with_dm_permission(mut self, allowed: bool) -> Self {
        self.dm_permission = Some(allowed);
        self
    }

    /// Record the remote id once a sync learns it.
    pub fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    /// Whether a remote id has been assigned.
    pub fn has_id(&self) -> bool {
        self.id != 0
    }

    /// Mutable access to the option tree (registry binding pass).
    pub fn options_mut(&mut self) -> &mut Vec<CommandOption> {
        &mut self.options
    }

    /// Whether the option tree nests subcommands or subcommand groups.
    pub fn is_subcommand_container(&self) -> bool {
        self.options.iter().any(|opt| opt.kind().is_nested())
    }

    /// Serialize to the registration dict shape the remote command API takes.
    ///
    /// The remote id is omitted; Discord assigns it.
    pub fn to_register_value(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
        }
        value
    }

    /// Decode a command from a remote snapshot entry.
    pub fn from_payload(payload: &serde_json::Value) -> GiottoResult<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| SyncError::new(SyncErrorKind::MalformedSnapshot(e.to_string())).into())
    }

    /// Homogeneity check for the root option list: all leaves, all groups,
    /// or all subcommands. Returns the offending description on violation.
    pub fn homogeneity_violation(&self) -> Option<String> {
        let mut leaves = 0usize;
        let mut groups = 0usize;
        let mut subcommands = 0usize;
        for option in &self.options {
            match option.kind() {
                OptionKind::SubCommand => subcommands += 1,
                OptionKind::SubCommandGroup => groups += 1,
                _ => leaves += 1,
            }
        }
        let populated =
            usize::from(leaves > 0) + usize::from(groups > 0) + usize::from(subcommands > 0);
        if populated > 1 {
            Some(format!(
                "mixed child kinds: {leaves} plain options, {groups} groups, {subcommands} subcommands"
            ))
        } else {
            None
        }
    }
}

// Structural equality for sync diffing: name, description, kind, permission
// metadata and the option tree. Remote id excluded.
impl PartialEq for ApplicationCommand {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.kind == other.kind
            && self.default_member_permissions == other.default_member_permissions
            && self.dm_permission == other.dm_permission
            && self.options == other.options
    }
}
