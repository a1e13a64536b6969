// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Ledgerdesk operator console.
//!
//! TOML files are layered with Figment, unknown keys are rejected, and every
//! failure is reported as a miette diagnostic with typo suggestions.
//!
//! ```no_run
//! use ledgerdesk_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("agent endpoint: {}", config.agent.endpoint);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AgentConfig, BackendConfig, ConsoleConfig, LedgerdeskConfig, PollingConfig};

/// Load from the standard hierarchy and validate.
pub fn load_and_validate() -> Result<LedgerdeskConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load a single explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<LedgerdeskConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::Other(format!(
            "config file `{}` does not exist",
            path.display()
        ))]);
    }
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load inline TOML and validate. Environment variables are ignored.
pub fn load_and_validate_str(toml_content: &str) -> Result<LedgerdeskConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<LedgerdeskConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<LedgerdeskConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every config file that exists, for source spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_search_paths()
        .iter()
        .filter_map(|path| read_source(path))
        .collect()
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    // Figment records file sources by absolute path.
    let display = std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    Some((display, content))
}
