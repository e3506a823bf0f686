//! Whitespace handling for free-text request fields.

use serde::{Deserialize, Deserializer};

/// Trims surrounding whitespace; a blank value becomes empty and fails the
/// field's length rule.
pub fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|raw| raw.trim().to_string())
}

pub fn deserialize_trimmed_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|raw| raw.map(|v| v.trim().to_string()))
}
