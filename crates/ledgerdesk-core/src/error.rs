// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ledgerdesk operator console.

use thiserror::Error;

/// The primary error type used across all Ledgerdesk crates.
///
/// Malformed inbound frames never produce an error: the classifier downgrades
/// them to plain text, so there is no variant for them.
#[derive(Debug, Error)]
pub enum LedgerdeskError {
    /// Configuration errors (invalid TOML, bad URL, zero interval).
    #[error("configuration error: {0}")]
    Config(String),

    /// Duplex transport errors (connection refused, handshake failure, I/O).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A send was attempted while the connection was not open.
    #[error("not connected: message was not sent")]
    NotConnected,

    /// An operator action failed local validation and was never sent.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A poll of one of the backend data sources failed.
    #[error("fetch of {source_name} failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerdeskError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        LedgerdeskError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for errors the operator should see as "failed to send".
    pub fn is_send_failure(&self) -> bool {
        matches!(
            self,
            LedgerdeskError::NotConnected | LedgerdeskError::Transport { .. }
        )
    }
}
