// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ledgerdesk integration tests.
//!
//! Mock implementations of the two external collaborators, so connection,
//! conversation and polling behavior can be tested without a network.
//!
//! - [`MockConnector`] - in-memory duplex link with frame injection and capture
//! - [`MockBackend`] - analytics backend with scripted per-source results

pub mod mock_backend;
pub mod mock_connector;

pub use mock_backend::MockBackend;
pub use mock_connector::MockConnector;
