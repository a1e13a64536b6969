// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order, later layers win:
//! 1. compiled defaults
//! 2. `/etc/ledgerdesk/ledgerdesk.toml`
//! 3. `~/.config/ledgerdesk/ledgerdesk.toml`
//! 4. `./ledgerdesk.toml`
//! 5. `LEDGERDESK_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LedgerdeskConfig;

pub const LOCAL_CONFIG: &str = "ledgerdesk.toml";
pub const SYSTEM_CONFIG: &str = "/etc/ledgerdesk/ledgerdesk.toml";

/// Sections whose names become the first dotted path segment of an env key.
const ENV_SECTIONS: [&str; 4] = ["console", "agent", "backend", "polling"];

/// `~/.config/ledgerdesk/ledgerdesk.toml`, if a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ledgerdesk").join(LOCAL_CONFIG))
}

/// Files consulted by [`load_config`], lowest precedence first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    paths.extend(user_config_path());
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Figment with every layer merged but not yet extracted.
pub fn build_figment() -> Figment {
    let figment = config_search_paths()
        .into_iter()
        .fold(defaults(), |fig, path| fig.merge(Toml::file(path)));
    figment.merge(env_provider())
}

/// Load from the standard hierarchy plus environment overrides.
pub fn load_config() -> Result<LedgerdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load defaults plus a single explicit file, then environment overrides.
///
/// Used for `--config PATH`; the search hierarchy is skipped.
pub fn load_config_from_path(path: &Path) -> Result<LedgerdeskConfig, figment::Error> {
    defaults()
        .merge(Toml::file_exact(path))
        .merge(env_provider())
        .extract()
}

/// Load defaults plus inline TOML. Environment variables are ignored.
pub fn load_config_from_str(toml_content: &str) -> Result<LedgerdeskConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(LedgerdeskConfig::default()))
}

/// `LEDGERDESK_POLLING_JITTER_MS` maps to `polling.jitter_ms`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys containing underscores survive intact. `Env::split("_")` would turn
/// `jitter_ms` into `jitter.ms`.
fn env_provider() -> Env {
    Env::prefixed("LEDGERDESK_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key)
            .into()
    })
}
