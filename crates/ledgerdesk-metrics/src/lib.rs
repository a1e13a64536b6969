// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics side of the console: the HTTP backend client, the polling
//! aggregator that keeps one snapshot per source, and the values derived
//! from those snapshots for display.

pub mod aggregator;
pub mod client;
pub mod derived;

pub use aggregator::{MetricsAggregator, MetricsSnapshot, PollEvent, PollSchedule, SourceHealth};
pub use client::BackendClient;
pub use derived::{DerivedMetrics, OverdueRisk, RiskBand, StatusBreakdown, Totals};
