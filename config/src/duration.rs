//! Serde helpers for humantime durations (`"3s"`, `"1m 30s"`).

use serde::{
    de::Error as _,
    Deserialize,
    Deserializer,
    Serializer,
};
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(|e| D::Error::custom(format!("invalid duration '{raw}': {e}")))
}
