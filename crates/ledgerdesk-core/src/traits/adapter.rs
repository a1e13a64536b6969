// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all external-collaborator adapters implement.

/// The base trait for Ledgerdesk adapters.
///
/// Every adapter (duplex connector, metrics backend) carries a stable name
/// used in log fields and diagnostics.
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;
}
