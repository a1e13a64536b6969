// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ledgerdesk operator console.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Ledgerdesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerdeskConfig {
    /// Console presentation and logging settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Remote agent duplex connection settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Analytics backend HTTP settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling schedule for the three backend sources.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Console presentation and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Agent greeting seeded into the transcript at startup. `None` disables it.
    #[serde(default = "default_greeting")]
    pub greeting: Option<String>,

    /// Path of the readline history file. `None` keeps history in memory only.
    #[serde(default)]
    pub history_file: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            greeting: default_greeting(),
            history_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_greeting() -> Option<String> {
    Some("Hi, how can I help you?".to_string())
}

/// Remote agent connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// WebSocket endpoint of the agent (`ws://` or `wss://`).
    #[serde(default = "default_agent_endpoint")]
    pub endpoint: String,

    /// Origin tag the agent prefixes to its frames (matched case-insensitively,
    /// followed by `:`). Empty disables prefix stripping.
    #[serde(default = "default_origin_tag")]
    pub origin_tag: String,

    /// Seconds to wait for the connection to open before reporting an error.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_agent_endpoint(),
            origin_tag: default_origin_tag(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl AgentConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_agent_endpoint() -> String {
    "ws://localhost:8000/ws/admin".to_string()
}

fn default_origin_tag() -> String {
    "admin bot".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Analytics backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the backend (`http://` or `https://`), without trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Path of the dashboard metrics endpoint.
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,

    /// Path of the overdue recurring invoices endpoint.
    #[serde(default = "default_overdue_path")]
    pub overdue_path: String,

    /// Path of the closed opportunities endpoint.
    #[serde(default = "default_opportunities_path")]
    pub opportunities_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            dashboard_path: default_dashboard_path(),
            overdue_path: default_overdue_path(),
            opportunities_path: default_opportunities_path(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_dashboard_path() -> String {
    "/dashboard-metrics".to_string()
}

fn default_overdue_path() -> String {
    "/overdue-recurring-invoices".to_string()
}

fn default_opportunities_path() -> String {
    "/closed-opportunities".to_string()
}

/// Polling schedule configuration.
///
/// Each source runs on its own fixed interval. Failed polls are retried on the
/// next tick only; there is no backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Seconds between dashboard metrics polls.
    #[serde(default = "default_dashboard_interval_secs")]
    pub dashboard_interval_secs: u64,

    /// Seconds between overdue invoice polls.
    #[serde(default = "default_list_interval_secs")]
    pub overdue_interval_secs: u64,

    /// Seconds between closed opportunity polls.
    #[serde(default = "default_list_interval_secs")]
    pub opportunities_interval_secs: u64,

    /// Upper bound of a random delay added before each scheduled poll.
    /// 0 keeps polls on the exact interval.
    #[serde(default)]
    pub jitter_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            dashboard_interval_secs: default_dashboard_interval_secs(),
            overdue_interval_secs: default_list_interval_secs(),
            opportunities_interval_secs: default_list_interval_secs(),
            jitter_ms: 0,
        }
    }
}

impl PollingConfig {
    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_interval_secs)
    }

    pub fn overdue_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_interval_secs)
    }

    pub fn opportunities_interval(&self) -> Duration {
        Duration::from_secs(self.opportunities_interval_secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

fn default_dashboard_interval_secs() -> u64 {
    30
}

fn default_list_interval_secs() -> u64 {
    60
}
