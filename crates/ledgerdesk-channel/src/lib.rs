// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duplex channel to the remote agent.
//!
//! [`WsConnector`] establishes WebSocket links; [`ConnectionManager`] owns the
//! single live link, gates sends on its status and publishes every status
//! transition through a watch channel.

pub mod connection;
pub mod ws;

pub use connection::{ConnectionHandle, ConnectionManager, FrameHandler};
pub use ws::WsConnector;
