// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connector trait for the duplex link to the remote agent.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, Stream};

use crate::error::LedgerdeskError;
use crate::traits::adapter::Adapter;

/// Outbound half of a duplex link. Each item is one text frame.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = LedgerdeskError> + Send>>;

/// Inbound half of a duplex link. The stream ends when the remote side closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, LedgerdeskError>> + Send>>;

/// An established duplex connection, split into its two halves.
pub struct DuplexLink {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl std::fmt::Debug for DuplexLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplexLink").finish_non_exhaustive()
    }
}

/// Opens duplex links to a remote agent endpoint.
///
/// Implementations only establish the link; lifecycle, status tracking and
/// send gating belong to the connection manager.
#[async_trait]
pub trait Connector: Adapter {
    /// Establishes a connection to `endpoint`.
    async fn connect(&self, endpoint: &str) -> Result<DuplexLink, LedgerdeskError>;
}
