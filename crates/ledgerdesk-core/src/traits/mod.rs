// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod backend;
pub mod connector;

pub use adapter::Adapter;
pub use backend::MetricsBackend;
pub use connector::{Connector, DuplexLink, FrameSink, FrameStream};
