// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ledgerdesk dashboard` command implementation.
//!
//! Polls every backend source once and prints the result, either as text or
//! as structured JSON for scripting.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use ledgerdesk_config::LedgerdeskConfig;
use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::metrics::{ClosedOpportunity, DashboardMetrics, DataSource, OverdueInvoice};
use ledgerdesk_core::MetricsBackend;
use ledgerdesk_metrics::{BackendClient, DerivedMetrics, MetricsAggregator, PollSchedule};

use crate::overlay::StatusFilter;
use crate::render;

/// JSON output of `ledgerdesk dashboard --json`.
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub dashboard: DashboardMetrics,
    pub derived: DerivedMetrics,
    pub overdue_invoices: Vec<OverdueInvoice>,
    pub closed_opportunities: Vec<ClosedOpportunity>,
    /// Sources that could not be fetched, keyed by source name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// Fetch every source once and build the report.
///
/// Fails only when no source could be fetched; partial results are returned
/// with the failures listed in `errors`.
pub async fn collect(backend: Arc<dyn MetricsBackend>) -> Result<DashboardReport, LedgerdeskError> {
    let aggregator = MetricsAggregator::new(backend, PollSchedule::default());
    let outcomes = aggregator.refresh_all().await;

    let mut errors = BTreeMap::new();
    for (source, outcome) in &outcomes {
        if let Err(e) = outcome {
            warn!(%source, error = %e, "source unavailable");
            errors.insert(source.to_string(), e.to_string());
        }
    }
    if errors.len() == DataSource::ALL.len() {
        return Err(LedgerdeskError::Fetch {
            source_name: "backend".to_string(),
            message: "no data source could be fetched".to_string(),
            source: None,
        });
    }

    let snapshot = aggregator.snapshot();
    aggregator.stop();
    Ok(DashboardReport {
        derived: snapshot.derived(),
        dashboard: *snapshot.dashboard,
        overdue_invoices: snapshot.overdue.to_vec(),
        closed_opportunities: snapshot.opportunities.to_vec(),
        errors,
    })
}

/// Runs the `ledgerdesk dashboard` command.
pub async fn run_dashboard(config: &LedgerdeskConfig, json: bool) -> Result<(), LedgerdeskError> {
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let report = collect(backend).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!(
        "{}\n",
        render::dashboard_summary(&report.dashboard, &report.derived)
    );
    println!("{}\n", render::overdue_invoices(&report.overdue_invoices));
    println!(
        "{}",
        render::opportunities(&report.closed_opportunities, &StatusFilter::all())
    );
    for (source, message) in &report.errors {
        eprintln!("{source}: {message}");
    }
    Ok(())
}
