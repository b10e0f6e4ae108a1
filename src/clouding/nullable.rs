//! Null-tolerant wire fields
//!
//! The API sends `null` for values it has nothing for (`"privateIp": null`,
//! `"userData": null`). `#[serde(default)]` only covers a missing key, so
//! fields that are not `Option` decode through [`or_default`].

use serde::{Deserialize, Deserializer};

/// Decode `null` as `T::default()`
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::deserialize(deserializer).map(Option::unwrap_or_default)
}
