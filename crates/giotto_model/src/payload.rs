//! Inbound interaction payload model.
//!
//! The transport layer hands the core decoded JSON payloads; these types
//! give the dispatch engine a typed view of them. Only the fields the core
//! routes on are modeled; everything else stays in the raw `data` value.

use crate::option::OptionKind;
use crate::CommandKind;
use giotto_error::{DispatchError, DispatchErrorKind, GiottoResult};
use serde::{Deserialize, Serialize};

/// Interaction type tag from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(try_from = "u8", into = "u8")]
pub enum InteractionKind {
    /// Gateway liveness ping.
    Ping = 1,
    /// Slash/user/context-menu command invocation.
    ApplicationCommand = 2,
    /// Button press or select submission.
    Component = 3,
    /// Autocomplete request for a focused option.
    Autocomplete = 4,
    /// Modal submission.
    ModalSubmit = 5,
}

impl From<InteractionKind> for u8 {
    fn from(kind: InteractionKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for InteractionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InteractionKind::Ping),
            2 => Ok(InteractionKind::ApplicationCommand),
            3 => Ok(InteractionKind::Component),
            4 => Ok(InteractionKind::Autocomplete),
            5 => Ok(InteractionKind::ModalSubmit),
            other => Err(format!("unknown interaction kind: {other}")),
        }
    }
}

/// Component type tag from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(try_from = "u8", into = "u8")]
pub enum ComponentKind {
    /// Layout container; never dispatched directly.
    ActionRow = 1,
    /// Clickable button.
    Button = 2,
    /// Select menu.
    Select = 3,
    /// Modal text input.
    TextInput = 4,
}

impl From<ComponentKind> for u8 {
    fn from(kind: ComponentKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for ComponentKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ComponentKind::ActionRow),
            2 => Ok(ComponentKind::Button),
            3 => Ok(ComponentKind::Select),
            4 => Ok(ComponentKind::TextInput),
            other => Err(format!("unknown component kind: {other}")),
        }
    }
}

/// Invoking user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct User {
    /// User snowflake id.
    #[serde(with = "crate::serde_util::snowflake")]
    id: u64,
    /// Username, when the transport includes it.
    #[serde(default)]
    username: Option<String>,
}

impl User {
    /// Create a user record.
    pub fn new(id: u64, username: Option<String>) -> Self {
        Self { id, username }
    }
}

/// Guild member wrapper around the invoking user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Member {
    /// The wrapped user record.
    #[serde(default)]
    user: Option<User>,
    /// Role ids held by the member.
    #[serde(default, with = "crate::serde_util::snowflake_vec")]
    roles: Vec<u64>,
}

impl Member {
    /// Create a member record.
    pub fn new(user: Option<User>, roles: Vec<u64>) -> Self {
        Self { user, roles }
    }
}

/// One decoded inbound interaction event.
///
/// The `data` object varies by interaction kind, so it stays raw here and is
/// decoded on demand by [`InteractionPayload::command_data`],
/// [`InteractionPayload::component_data`] and
/// [`InteractionPayload::modal_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct InteractionPayload {
    /// Interaction snowflake id.
    #[serde(with = "crate::serde_util::snowflake")]
    id: u64,
    /// Interaction type tag.
    #[serde(rename = "type")]
    kind: InteractionKind,
    /// One-time response token.
    #[serde(default)]
    token: String,
    /// Owning application id.
    #[serde(default, with = "crate::serde_util::snowflake")]
    application_id: u64,
    /// Guild the interaction came from, if any.
    #[serde(default, with = "crate::serde_util::snowflake_opt")]
    guild_id: Option<u64>,
    /// Channel the interaction came from, if any.
    #[serde(default, with = "crate::serde_util::snowflake_opt")]
    channel_id: Option<u64>,
    /// Member record, present for guild interactions.
    #[serde(default)]
    member: Option<Member>,
    /// User record, present for DM interactions.
    #[serde(default)]
    user: Option<User>,
    /// Kind-specific payload body.
    #[serde(default)]
    data: serde_json::Value,
}

impl InteractionPayload {
    /// Decode a payload from a raw JSON value.
    pub fn from_value(value: serde_json::Value) -> GiottoResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| DispatchError::new(DispatchErrorKind::MalformedPayload(e.to_string())).into())
    }

    /// Id of the invoking user, wherever the transport put it.
    pub fn author_id(&self) -> Option<u64> {
        if let Some(member) = &self.member {
            if let Some(user) = member.user() {
                return Some(*user.id());
            }
        }
        self.user.as_ref().map(|user| *user.id())
    }

    /// Role ids of the invoking member; empty outside guilds.
    pub fn author_roles(&self) -> &[u64] {
        self.member
            .as_ref()
            .map(|member| member.roles().as_slice())
            .unwrap_or(&[])
    }

    /// Whether the interaction came from a guild.
    pub fn is_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Decode the application-command body (types 2 and 4).
    pub fn command_data(&self) -> GiottoResult<CommandData> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| DispatchError::new(DispatchErrorKind::MalformedPayload(e.to_string())).into())
    }

    /// Decode the component body (type 3).
    pub fn component_data(&self) -> GiottoResult<ComponentData> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| DispatchError::new(DispatchErrorKind::MalformedPayload(e.to_string())).into())
    }

    /// Decode the modal-submit body (type 5).
    pub fn modal_data(&self) -> GiottoResult<ModalData> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| DispatchError::new(DispatchErrorKind::MalformedPayload(e.to_string())).into())
    }
}

/// Application-command invocation body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct CommandData {
    /// Remote command id the user invoked.
    #[serde(default, with = "crate::serde_util::snowflake")]
    id: u64,
    /// Command name.
    name: String,
    /// Command kind; selects the lookup namespace.
    #[serde(rename = "type", default = "default_command_kind")]
    kind: CommandKind,
    /// Supplied option values, possibly nesting subcommand paths.
    #[serde(default)]
    options: Vec<DataOption>,
    /// Target entity for user/message commands.
    #[serde(default, with = "crate::serde_util::snowflake_opt")]
    target_id: Option<u64>,
}

fn default_command_kind() -> CommandKind {
    CommandKind::ChatInput
}

impl CommandData {
    /// The subcommand-group node among the supplied options, if any.
    pub fn subcommand_group(&self) -> Option<&DataOption> {
        self.options
            .iter()
            .find(|opt| *opt.kind() == OptionKind::SubCommandGroup)
    }

    /// The subcommand node among the supplied options (directly or under a
    /// group), if any.
    pub fn subcommand(&self) -> Option<&DataOption> {
        if let Some(group) = self.subcommand_group() {
            return group.subcommand();
        }
        self.options
            .iter()
            .find(|opt| *opt.kind() == OptionKind::SubCommand)
    }

    /// Names of every focused option anywhere in the supplied tree.
    pub fn focused_options(&self) -> Vec<String> {
        let mut focused = Vec::new();
        for option in &self.options {
            option.collect_focused(&mut focused);
        }
        focused
    }
}

/// One supplied option value, or a nested subcommand path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct DataOption {
    /// Option name as declared.
    name: String,
    /// Wire kind of the supplied value.
    #[serde(rename = "type")]
    kind: OptionKind,
    /// Supplied scalar value; absent for subcommand nodes.
    #[serde(default)]
    value: Option<serde_json::Value>,
    /// Child options, for subcommand path segments.
    #[serde(default)]
    options: Vec<DataOption>,
    /// Whether this option has input focus (autocomplete).
    #[serde(default)]
    focused: bool,
}

impl DataOption {
    /// Build a supplied leaf value (test/transport helper).
    pub fn leaf(name: impl Into<String>, kind: OptionKind, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value),
            options: Vec::new(),
            focused: false,
        }
    }

    /// Build a nested subcommand or group node (test/transport helper).
    pub fn nested(name: impl Into<String>, kind: OptionKind, options: Vec<DataOption>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
            options,
            focused: false,
        }
    }

    /// Mark this option focused (test/transport helper).
    pub fn with_focus(mut self) -> Self {
        self.focused = true;
        self
    }

    /// The subcommand node among this node's children, if any.
    pub fn subcommand(&self) -> Option<&DataOption> {
        self.options
            .iter()
            .find(|opt| *opt.kind() == OptionKind::SubCommand)
    }

    /// Decode the supplied value into a typed [`OptionValue`].
    pub fn decoded_value(&self) -> OptionValue {
        match &self.value {
            None => OptionValue::Missing,
            Some(raw) => OptionValue::decode(self.kind, raw),
        }
    }

    fn collect_focused(&self, focused: &mut Vec<String>) {
        if self.focused {
            focused.push(self.name.clone());
        }
        for child in &self.options {
            child.collect_focused(focused);
        }
    }
}

/// Typed view of one supplied option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// String option value.
    String(String),
    /// Integer option value.
    Integer(i64),
    /// Boolean option value.
    Boolean(bool),
    /// Floating point option value.
    Number(f64),
    /// User id reference.
    User(u64),
    /// Channel id reference.
    Channel(u64),
    /// Role id reference.
    Role(u64),
    /// User-or-role id reference.
    Mentionable(u64),
    /// Attachment metadata, kept raw.
    Attachment(serde_json::Value),
    /// Value of a kind the decoder does not special-case.
    Raw(serde_json::Value),
    /// No value supplied.
    Missing,
}

impl OptionValue {
    fn decode(kind: OptionKind, raw: &serde_json::Value) -> Self {
        fn as_snowflake(raw: &serde_json::Value) -> Option<u64> {
            raw.as_u64().or_else(|| raw.as_str()?.parse().ok())
        }

        match kind {
            OptionKind::String => raw
                .as_str()
                .map(|s| OptionValue::String(s.to_string()))
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Integer => raw
                .as_i64()
                .map(OptionValue::Integer)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Boolean => raw
                .as_bool()
                .map(OptionValue::Boolean)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Number => raw
                .as_f64()
                .map(OptionValue::Number)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::User => as_snowflake(raw)
                .map(OptionValue::User)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Channel => as_snowflake(raw)
                .map(OptionValue::Channel)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Role => as_snowflake(raw)
                .map(OptionValue::Role)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Mentionable => as_snowflake(raw)
                .map(OptionValue::Mentionable)
                .unwrap_or_else(|| OptionValue::Raw(raw.clone())),
            OptionKind::Attachment => OptionValue::Attachment(raw.clone()),
            OptionKind::SubCommand | OptionKind::SubCommandGroup => OptionValue::Raw(raw.clone()),
        }
    }

    /// String payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Component interaction body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ComponentData {
    /// Custom id routing key.
    custom_id: String,
    /// Kind of the activated component.
    component_type: ComponentKind,
    /// Selected values, for select menus.
    #[serde(default)]
    values: Vec<String>,
}

impl ComponentData {
    /// Create a component body (test/transport helper).
    pub fn new(custom_id: impl Into<String>, component_type: ComponentKind) -> Self {
        Self {
            custom_id: custom_id.into(),
            component_type,
            values: Vec::new(),
        }
    }

    /// Attach selected values (test/transport helper).
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }
}

/// One submitted text input from a modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct TextInputValue {
    /// Custom id of the text input.
    custom_id: String,
    /// Submitted text.
    #[serde(default)]
    value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ModalRow {
    #[serde(default)]
    components: Vec<TextInputValue>,
}

/// Modal submission body.
///
/// Discord nests submitted inputs inside action rows; [`ModalData::inputs`]
/// flattens them back out, which is the only shape the core surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ModalData {
    /// Custom id of the modal.
    custom_id: String,
    #[serde(default)]
    #[getter(skip)]
    components: Vec<ModalRow>,
}

impl ModalData {
    /// Flattened list of submitted text inputs, in row order.
    pub fn inputs(&self) -> Vec<TextInputValue> {
        self.components
            .iter()
            .flat_map(|row| row.components.iter().cloned())
            .collect()
    }
}
