//! Command option model.
//!
//! Options describe the arguments a slash command accepts, including the
//! nested subcommand/subcommand-group nodes that Discord models as options
//! with children.

use giotto_error::{GiottoResult, RegistryError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Declared value kind of a command option.
///
/// Wire values follow the Discord application command option type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(try_from = "u8", into = "u8")]
pub enum OptionKind {
    /// Nested subcommand node.
    SubCommand = 1,
    /// Nested subcommand-group node.
    SubCommandGroup = 2,
    /// Free-form string value.
    String = 3,
    /// Integer value.
    Integer = 4,
    /// Boolean value.
    Boolean = 5,
    /// User mention/id.
    User = 6,
    /// Channel mention/id.
    Channel = 7,
    /// Role mention/id.
    Role = 8,
    /// User or role mention/id.
    Mentionable = 9,
    /// Floating point value.
    Number = 10,
    /// Uploaded attachment.
    Attachment = 11,
}

impl OptionKind {
    /// Whether min/max numeric constraints are valid for this kind.
    pub fn is_numeric(&self) -> bool {
        matches!(self, OptionKind::Integer | OptionKind::Number)
    }

    /// Whether this kind is a nested command node rather than a leaf value.
    pub fn is_nested(&self) -> bool {
        matches!(self, OptionKind::SubCommand | OptionKind::SubCommandGroup)
    }
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            1 => OptionKind::SubCommand,
            2 => OptionKind::SubCommandGroup,
            3 => OptionKind::String,
            4 => OptionKind::Integer,
            5 => OptionKind::Boolean,
            6 => OptionKind::User,
            7 => OptionKind::Channel,
            8 => OptionKind::Role,
            9 => OptionKind::Mentionable,
            10 => OptionKind::Number,
            11 => OptionKind::Attachment,
            other => return Err(format!("unknown option kind: {other}")),
        };
        Ok(kind)
    }
}

/// Scalar value of an option choice.
///
/// Discord accepts string, integer or double choice values depending on the
/// option kind; the wire format carries them untagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    /// Integer choice value.
    Integer(i64),
    /// Floating point choice value.
    Number(f64),
    /// String choice value.
    String(String),
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        ChoiceValue::String(value.to_string())
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        ChoiceValue::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        ChoiceValue::Number(value)
    }
}

/// A fixed choice a user can pick for an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct OptionChoice {
    /// Display name of the choice; max 100 characters.
    name: String,
    /// Value submitted when the choice is picked.
    value: ChoiceValue,
}

impl OptionChoice {
    /// Create a new choice.
    pub fn new(name: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declared shape of one command option, or one nested subcommand node.
///
/// `parameter_name` is the local handler-parameter binding established at
/// registration time; it never leaves the process and does not participate
/// in structural equality.
#[derive(Debug, Clone, Serialize, Deserialize, derive_getters::Getters)]
pub struct CommandOption {
    /// Option name as Discord shows it.
    name: String,
    /// Option description.
    #[serde(default = "default_description")]
    description: String,
    /// Declared value kind.
    #[serde(rename = "type")]
    kind: OptionKind,
    /// Whether the option must be supplied.
    #[serde(default)]
    required: bool,
    /// Fixed choice list; empty means free-form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    choices: Vec<OptionChoice>,
    /// Minimum accepted value for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_value: Option<f64>,
    /// Maximum accepted value for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_value: Option<f64>,
    /// Channel type filter for channel options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    channel_types: Vec<u8>,
    /// Whether the option offers autocomplete.
    #[serde(default)]
    autocomplete: bool,
    /// Child options, for subcommand and subcommand-group nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<CommandOption>,
    /// Bound handler parameter name (local only).
    #[serde(skip)]
    parameter_name: Option<String>,
}

fn default_description() -> String {
    "No description.".to_string()
}

impl CommandOption {
    /// Create a leaf option of the given kind.
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: default_description(),
            kind,
            required: false,
            choices: Vec::new(),
            min_value: None,
            max_value: None,
            channel_types: Vec::new(),
            autocomplete: false,
            options: Vec::new(),
            parameter_name: None,
        }
    }

    /// Placeholder option auto-filled for a declared handler parameter that
    /// has no explicit option. Takes the parameter's name and kind hint.
    pub fn placeholder(name: impl Into<String>, kind: OptionKind) -> Self {
        let name = name.into();
        let mut option = Self::new(name.clone(), kind);
        option.parameter_name = Some(name);
        option
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the option required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Append a fixed choice.
    pub fn with_choice(mut self, choice: OptionChoice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Set the minimum accepted numeric value.
    pub fn with_min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    /// Set the maximum accepted numeric value.
    pub fn with_max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Restrict a channel option to the given channel types.
    pub fn with_channel_types(mut self, types: Vec<u8>) -> Self {
        self.channel_types = types;
        self
    }

    /// Enable autocomplete for this option.
    pub fn with_autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    /// Override the handler parameter this option binds to.
    pub fn with_parameter_name(mut self, parameter: impl Into<String>) -> Self {
        self.parameter_name = Some(parameter.into());
        self
    }

    /// Replace the child option list (subcommand/group nodes only).
    pub fn with_options(mut self, options: Vec<CommandOption>) -> Self {
        self.options = options;
        self
    }

    /// Bind the handler parameter name in place. Used by the registry when
    /// it reconciles declared parameters against the option list.
    pub fn bind_parameter(&mut self, parameter: impl Into<String>) {
        self.parameter_name = Some(parameter.into());
    }

    /// Force the required flag in place.
    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    /// The name the supplied value is delivered under when invoking the
    /// handler: the bound parameter name if one was set, otherwise the
    /// option name itself.
    pub fn binding(&self) -> &str {
        self.parameter_name.as_deref().unwrap_or(&self.name)
    }

    /// Mutable access to child options (registry binding pass).
    pub fn options_mut(&mut self) -> &mut Vec<CommandOption> {
        &mut self.options
    }

    /// Validate constraint placement for this option and its children.
    ///
    /// Numeric bounds are only legal on integer/number options and channel
    /// type filters only on channel options; either misplacement is an
    /// `InvalidOptionConfiguration`. Combining choices with autocomplete is
    /// legal but suspicious, so it only warns.
    pub fn validate(&self, command: &str) -> GiottoResult<()> {
        if (self.min_value.is_some() || self.max_value.is_some()) && !self.kind.is_numeric() {
            return Err(RegistryError::invalid_options(
                command,
                format!(
                    "option '{}' declares min/max value but has kind {}",
                    self.name, self.kind
                ),
            )
            .into());
        }
        if !self.channel_types.is_empty() && self.kind != OptionKind::Channel {
            return Err(RegistryError::invalid_options(
                command,
                format!(
                    "option '{}' declares a channel type filter but has kind {}",
                    self.name, self.kind
                ),
            )
            .into());
        }
        if self.autocomplete && !self.choices.is_empty() {
            warn!(
                command,
                option = %self.name,
                "option combines autocomplete with a fixed choice list"
            );
        }
        for child in &self.options {
            child.validate(command)?;
        }
        Ok(())
    }
}

// Structural equality for sync diffing: everything the server echoes back,
// but not the local parameter binding.
impl PartialEq for CommandOption {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.kind == other.kind
            && self.required == other.required
            && self.choices == other.choices
            && self.min_value == other.min_value
            && self.max_value == other.max_value
            && self.channel_types == other.channel_types
            && self.autocomplete == other.autocomplete
            && self.options == other.options
    }
}
