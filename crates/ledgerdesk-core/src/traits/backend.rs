// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait for the three polled analytics sources.

use async_trait::async_trait;

use crate::error::LedgerdeskError;
use crate::metrics::{ClosedOpportunity, DashboardMetrics, OverdueInvoice};
use crate::traits::adapter::Adapter;

/// Read-only access to the analytics backend.
///
/// Each method performs exactly one fetch. A returned value is always a
/// complete snapshot; partial data is never surfaced as `Ok`.
#[async_trait]
pub trait MetricsBackend: Adapter {
    /// Revenue and per-status invoice totals.
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, LedgerdeskError>;

    /// Recurring invoices past their due date.
    async fn overdue_invoices(&self) -> Result<Vec<OverdueInvoice>, LedgerdeskError>;

    /// Recently closed sales opportunities.
    async fn closed_opportunities(&self) -> Result<Vec<ClosedOpportunity>, LedgerdeskError>;
}
