// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock analytics backend with scripted per-source results.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use ledgerdesk_core::metrics::{ClosedOpportunity, DashboardMetrics, DataSource, OverdueInvoice};
use ledgerdesk_core::traits::{Adapter, MetricsBackend};
use ledgerdesk_core::LedgerdeskError;

/// Result a source returns on every call until re-scripted.
type Scripted<T> = Result<T, String>;

struct State {
    dashboard: Scripted<DashboardMetrics>,
    overdue: Scripted<Vec<OverdueInvoice>>,
    opportunities: Scripted<Vec<ClosedOpportunity>>,
    calls: [usize; 3],
    delay: Duration,
}

/// A [`MetricsBackend`] whose responses are set by the test.
///
/// Every source starts out returning an empty, successful snapshot.
pub struct MockBackend {
    state: Mutex<State>,
    called: Notify,
}

fn slot(source: DataSource) -> usize {
    match source {
        DataSource::DashboardMetrics => 0,
        DataSource::OverdueInvoices => 1,
        DataSource::ClosedOpportunities => 2,
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                dashboard: Ok(DashboardMetrics::default()),
                overdue: Ok(Vec::new()),
                opportunities: Ok(Vec::new()),
                calls: [0; 3],
                delay: Duration::ZERO,
            }),
            called: Notify::new(),
        }
    }

    pub async fn set_dashboard(&self, metrics: DashboardMetrics) {
        self.state.lock().await.dashboard = Ok(metrics);
    }

    pub async fn set_overdue(&self, invoices: Vec<OverdueInvoice>) {
        self.state.lock().await.overdue = Ok(invoices);
    }

    pub async fn set_opportunities(&self, opportunities: Vec<ClosedOpportunity>) {
        self.state.lock().await.opportunities = Ok(opportunities);
    }

    /// Make `source` fail with `message` until it is re-scripted.
    pub async fn fail(&self, source: DataSource, message: &str) {
        let mut state = self.state.lock().await;
        let message = message.to_string();
        match source {
            DataSource::DashboardMetrics => state.dashboard = Err(message),
            DataSource::OverdueInvoices => state.overdue = Err(message),
            DataSource::ClosedOpportunities => state.opportunities = Err(message),
        }
    }

    /// Delay every response by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.lock().await.delay = delay;
    }

    /// Number of fetches `source` has received.
    pub async fn calls(&self, source: DataSource) -> usize {
        self.state.lock().await.calls[slot(source)]
    }

    /// Wait until `source` has been fetched at least `count` times, or two
    /// seconds pass. Returns the observed count.
    pub async fn wait_for_calls(&self, source: DataSource, count: usize) -> usize {
        let wait = async {
            loop {
                let notified = self.called.notified();
                let seen = self.calls(source).await;
                if seen >= count {
                    return seen;
                }
                notified.await;
            }
        };
        match tokio::time::timeout(Duration::from_secs(2), wait).await {
            Ok(seen) => seen,
            Err(_) => self.calls(source).await,
        }
    }

    async fn record(&self, source: DataSource) -> Duration {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls[slot(source)] += 1;
            state.delay
        };
        self.called.notify_waiters();
        delay
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch_error(source: DataSource, message: &str) -> LedgerdeskError {
    LedgerdeskError::Fetch {
        source_name: source.to_string(),
        message: message.to_string(),
        source: None,
    }
}

async fn respond<T: Clone>(
    backend: &MockBackend,
    source: DataSource,
    pick: impl FnOnce(&State) -> &Scripted<T>,
) -> Result<T, LedgerdeskError> {
    let delay = backend.record(source).await;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let state = backend.state.lock().await;
    pick(&*state)
        .clone()
        .map_err(|message| fetch_error(source, &message))
}

impl Adapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }
}

#[async_trait]
impl MetricsBackend for MockBackend {
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, LedgerdeskError> {
        respond(self, DataSource::DashboardMetrics, |s| &s.dashboard).await
    }

    async fn overdue_invoices(&self) -> Result<Vec<OverdueInvoice>, LedgerdeskError> {
        respond(self, DataSource::OverdueInvoices, |s| &s.overdue).await
    }

    async fn closed_opportunities(&self) -> Result<Vec<ClosedOpportunity>, LedgerdeskError> {
        respond(self, DataSource::ClosedOpportunities, |s| &s.opportunities).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_are_empty_successes() {
        let backend = MockBackend::new();
        assert_eq!(
            backend.dashboard_metrics().await.unwrap(),
            DashboardMetrics::default()
        );
        assert!(backend.overdue_invoices().await.unwrap().is_empty());
        assert_eq!(backend.calls(DataSource::OverdueInvoices).await, 1);
        assert_eq!(backend.calls(DataSource::ClosedOpportunities).await, 0);
    }

    #[tokio::test]
    async fn scripted_failure_is_sticky_until_reset() {
        let backend = MockBackend::new();
        backend.fail(DataSource::ClosedOpportunities, "HTTP 500").await;
        assert!(backend.closed_opportunities().await.is_err());
        assert!(backend.closed_opportunities().await.is_err());

        backend.set_opportunities(vec![ClosedOpportunity::default()]).await;
        assert_eq!(backend.closed_opportunities().await.unwrap().len(), 1);
    }
}
