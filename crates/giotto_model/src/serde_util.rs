//! Serde helpers for Discord wire quirks.
//!
//! Discord serializes snowflake ids and permission bitsets as decimal
//! strings to dodge 53-bit JSON number truncation, but tooling (and older
//! payloads) sometimes carries them as numbers. These helpers accept either
//! on the way in and emit strings on the way out.

use serde::de::{self, Deserializer, Unexpected};
use serde::ser::Serializer;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(u64),
}

fn parse(value: StringOrNumber) -> Result<u64, String> {
    match value {
        StringOrNumber::Number(n) => Ok(n),
        StringOrNumber::Text(s) => s
            .parse::<u64>()
            .map_err(|_| format!("invalid snowflake: {s}")),
    }
}

/// Snowflake ids: string on the wire, `u64` in memory.
pub mod snowflake {
    use super::*;

    /// Serialize a snowflake as a decimal string.
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize a snowflake from a string or number.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = StringOrNumber::deserialize(deserializer)?;
        parse(raw).map_err(|msg| de::Error::invalid_value(Unexpected::Other(&msg), &"a snowflake"))
    }
}

/// Optional snowflake ids.
pub mod snowflake_opt {
    use super::*;

    /// Serialize an optional snowflake as a decimal string.
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional snowflake from a string, number or null.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let raw = Option::<StringOrNumber>::deserialize(deserializer)?;
        raw.map(parse)
            .transpose()
            .map_err(|msg| de::Error::invalid_value(Unexpected::Other(&msg), &"a snowflake"))
    }
}

/// Optional permission bitsets; same wire shape as optional snowflakes.
pub mod permissions_opt {
    use super::*;

    /// Serialize an optional permission bitset as a decimal string.
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        super::snowflake_opt::serialize(value, serializer)
    }

    /// Deserialize an optional permission bitset.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        super::snowflake_opt::deserialize(deserializer)
    }
}

/// Lists of snowflakes (role id lists on members).
pub mod snowflake_vec {
    use super::*;

    /// Serialize snowflakes as decimal strings.
    pub fn serialize<S: Serializer>(value: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(value.iter().map(u64::to_string))
    }

    /// Deserialize snowflakes from strings or numbers.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let raw = Vec::<StringOrNumber>::deserialize(deserializer)?;
        raw.into_iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|msg| de::Error::invalid_value(Unexpected::Other(&msg), &"a snowflake"))
    }
}
