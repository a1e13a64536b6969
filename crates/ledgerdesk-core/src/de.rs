// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field deserializers shared by the wire models.

use serde::{Deserialize, Deserializer};

/// Decode an explicit JSON `null` the same as an absent field.
///
/// Pair with `#[serde(default)]` so both cases yield `T::default()`.
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
