// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that run after deserialization.
//!
//! All checks run; errors are collected rather than returned on the first hit.

use crate::diagnostic::ConfigError;
use crate::model::LedgerdeskConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &LedgerdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.console.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(
            "console.log_level",
            format!(
                "`{}` is not one of {}",
                config.console.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    check_scheme(
        &mut errors,
        "agent.endpoint",
        &config.agent.endpoint,
        &["ws://", "wss://"],
    );
    check_positive(
        &mut errors,
        "agent.connect_timeout_secs",
        config.agent.connect_timeout_secs,
    );

    check_scheme(
        &mut errors,
        "backend.base_url",
        &config.backend.base_url,
        &["http://", "https://"],
    );
    check_positive(
        &mut errors,
        "backend.request_timeout_secs",
        config.backend.request_timeout_secs,
    );
    for (key, path) in [
        ("backend.dashboard_path", &config.backend.dashboard_path),
        ("backend.overdue_path", &config.backend.overdue_path),
        ("backend.opportunities_path", &config.backend.opportunities_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ConfigError::validation(
                key,
                format!("`{path}` must start with `/`"),
            ));
        }
    }

    check_positive(
        &mut errors,
        "polling.dashboard_interval_secs",
        config.polling.dashboard_interval_secs,
    );
    check_positive(
        &mut errors,
        "polling.overdue_interval_secs",
        config.polling.overdue_interval_secs,
    );
    check_positive(
        &mut errors,
        "polling.opportunities_interval_secs",
        config.polling.opportunities_interval_secs,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_scheme(errors: &mut Vec<ConfigError>, key: &str, value: &str, schemes: &[&str]) {
    let value = value.trim();
    let Some(rest) = schemes.iter().find_map(|s| value.strip_prefix(s)) else {
        errors.push(ConfigError::validation(
            key,
            format!("`{value}` must start with {}", schemes.join(" or ")),
        ));
        return;
    };
    if rest.is_empty() || rest.starts_with('/') {
        errors.push(ConfigError::validation(
            key,
            format!("`{value}` has no host"),
        ));
    }
}

fn check_positive(errors: &mut Vec<ConfigError>, key: &str, value: u64) {
    if value == 0 {
        errors.push(ConfigError::validation(key, "must be greater than 0"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(errors: &[ConfigError]) -> Vec<&str> {
        errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::Validation { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn defaults_validate() {
        assert!(validate_config(&LedgerdeskConfig::default()).is_ok());
    }

    #[test]
    fn http_agent_endpoint_is_rejected() {
        let mut config = LedgerdeskConfig::default();
        config.agent.endpoint = "http://localhost:8000/ws/admin".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["agent.endpoint"]);
    }

    #[test]
    fn wss_endpoint_is_accepted() {
        let mut config = LedgerdeskConfig::default();
        config.agent.endpoint = "wss://agent.example.com/ws/admin".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn base_url_without_host_is_rejected() {
        let mut config = LedgerdeskConfig::default();
        config.backend.base_url = "http://".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["backend.base_url"]);
    }

    #[test]
    fn zero_intervals_are_all_reported() {
        let mut config = LedgerdeskConfig::default();
        config.polling.dashboard_interval_secs = 0;
        config.polling.opportunities_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            keys(&errors),
            vec![
                "polling.dashboard_interval_secs",
                "polling.opportunities_interval_secs"
            ]
        );
    }

    #[test]
    fn relative_path_is_rejected() {
        let mut config = LedgerdeskConfig::default();
        config.backend.overdue_path = "overdue".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["backend.overdue_path"]);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = LedgerdeskConfig::default();
        config.console.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());

        config.console.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(keys(&errors), vec!["console.log_level"]);
    }
}
