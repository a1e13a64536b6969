// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Independent polling of the three backend sources.
//!
//! Each source owns one slot holding its latest snapshot. A successful fetch
//! swaps the whole snapshot in one step; a failed fetch only touches the
//! slot's health counters. Every fetch takes a ticket when it starts, and a
//! result is applied only if its ticket is newer than the one that produced
//! the current snapshot, so a slow fetch can never overwrite a fresher one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use ledgerdesk_config::PollingConfig;
use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::metrics::{ClosedOpportunity, DashboardMetrics, DataSource, OverdueInvoice};
use ledgerdesk_core::traits::MetricsBackend;

use crate::derived::DerivedMetrics;

const EVENT_CAPACITY: usize = 64;

/// `tokio::time::interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Poll periods per source plus the optional random delay added to each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub dashboard: Duration,
    pub overdue: Duration,
    pub opportunities: Duration,
    /// Upper bound of the per-tick random delay. Zero keeps ticks fixed.
    pub jitter: Duration,
}

impl PollSchedule {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            dashboard: config.dashboard_interval(),
            overdue: config.overdue_interval(),
            opportunities: config.opportunities_interval(),
            jitter: config.jitter(),
        }
    }

    pub fn period(&self, source: DataSource) -> Duration {
        match source {
            DataSource::DashboardMetrics => self.dashboard,
            DataSource::OverdueInvoices => self.overdue,
            DataSource::ClosedOpportunities => self.opportunities,
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

/// Staleness information for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHealth {
    /// Time of the most recent applied success. `None` until the first one.
    pub refreshed_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub last_error: Option<String>,
}

impl SourceHealth {
    pub fn is_failing(&self) -> bool {
        self.consecutive_failures > 0
    }
}

/// Published after every settled poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Refreshed { source: DataSource },
    Failed { source: DataSource, message: String },
}

/// Latest snapshots of all three sources, read together.
///
/// Each field is an independent immutable copy; the three may come from
/// different poll rounds.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub dashboard: Arc<DashboardMetrics>,
    pub overdue: Arc<Vec<OverdueInvoice>>,
    pub opportunities: Arc<Vec<ClosedOpportunity>>,
}

impl MetricsSnapshot {
    pub fn derived(&self) -> DerivedMetrics {
        DerivedMetrics::from_metrics(&self.dashboard)
    }
}

struct SlotState<T> {
    /// Ticket of the fetch that produced `value`. Zero for the initial empty value.
    ticket: u64,
    value: Arc<T>,
    health: SourceHealth,
}

struct Slot<T> {
    state: ArcSwap<SlotState<T>>,
    tickets: AtomicU64,
}

impl<T: Default> Slot<T> {
    fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(SlotState {
                ticket: 0,
                value: Arc::new(T::default()),
                health: SourceHealth::default(),
            }),
            tickets: AtomicU64::new(0),
        }
    }
}

impl<T> Slot<T> {
    fn issue_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn value(&self) -> Arc<T> {
        Arc::clone(&self.state.load().value)
    }

    fn health(&self) -> SourceHealth {
        self.state.load().health.clone()
    }

    /// Returns `false` when a newer result already landed.
    fn apply_success(&self, ticket: u64, value: T) -> bool {
        let value = Arc::new(value);
        let now = Utc::now();
        let previous = self.state.rcu(|current| {
            if ticket <= current.ticket {
                return Arc::clone(current);
            }
            Arc::new(SlotState {
                ticket,
                value: Arc::clone(&value),
                health: SourceHealth {
                    refreshed_at: Some(now),
                    consecutive_failures: 0,
                    total_failures: current.health.total_failures,
                    last_error: None,
                },
            })
        });
        previous.ticket < ticket
    }

    /// The snapshot is never touched. Failures older than the current
    /// snapshot are ignored.
    fn apply_failure(&self, ticket: u64, message: &str) -> bool {
        let previous = self.state.rcu(|current| {
            if ticket <= current.ticket {
                return Arc::clone(current);
            }
            let mut health = current.health.clone();
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
            health.total_failures += 1;
            health.last_error = Some(message.to_string());
            Arc::new(SlotState {
                ticket: current.ticket,
                value: Arc::clone(&current.value),
                health,
            })
        });
        previous.ticket < ticket
    }
}

struct Shared {
    backend: Arc<dyn MetricsBackend>,
    dashboard: Slot<DashboardMetrics>,
    overdue: Slot<Vec<OverdueInvoice>>,
    opportunities: Slot<Vec<ClosedOpportunity>>,
    events: broadcast::Sender<PollEvent>,
    cancel: CancellationToken,
}

fn stopped_error() -> LedgerdeskError {
    LedgerdeskError::Internal("metrics aggregator is stopped".to_string())
}

impl Shared {
    async fn poll(&self, source: DataSource) -> Result<(), LedgerdeskError> {
        match source {
            DataSource::DashboardMetrics => {
                self.poll_slot(source, &self.dashboard, self.backend.dashboard_metrics())
                    .await
            }
            DataSource::OverdueInvoices => {
                self.poll_slot(source, &self.overdue, self.backend.overdue_invoices())
                    .await
            }
            DataSource::ClosedOpportunities => {
                self.poll_slot(
                    source,
                    &self.opportunities,
                    self.backend.closed_opportunities(),
                )
                .await
            }
        }
    }

    async fn poll_slot<T, F>(
        &self,
        source: DataSource,
        slot: &Slot<T>,
        fetch: F,
    ) -> Result<(), LedgerdeskError>
    where
        F: Future<Output = Result<T, LedgerdeskError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(stopped_error());
        }
        let ticket = slot.issue_ticket();
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Err(stopped_error()),
            result = fetch => result,
        };
        // A fetch that completed in the same instant as stop() is still discarded.
        if self.cancel.is_cancelled() {
            return Err(stopped_error());
        }

        match result {
            Ok(value) => {
                if slot.apply_success(ticket, value) {
                    debug!(%source, ticket, "snapshot replaced");
                    let _ = self.events.send(PollEvent::Refreshed { source });
                } else {
                    debug!(%source, ticket, "stale result discarded");
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if slot.apply_failure(ticket, &message) {
                    warn!(%source, error = %message, "poll failed, keeping previous snapshot");
                    let _ = self.events.send(PollEvent::Failed { source, message });
                }
                Err(e)
            }
        }
    }
}

/// Polls the three sources on independent timers and serves their latest
/// snapshots.
pub struct MetricsAggregator {
    shared: Arc<Shared>,
    schedule: PollSchedule,
    tracker: TaskTracker,
    started: AtomicBool,
}

impl MetricsAggregator {
    pub fn new(backend: Arc<dyn MetricsBackend>, schedule: PollSchedule) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                backend,
                dashboard: Slot::new(),
                overdue: Slot::new(),
                opportunities: Slot::new(),
                events,
                cancel: CancellationToken::new(),
            }),
            schedule,
            tracker: TaskTracker::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Spawn one polling loop per source. Each loop fetches immediately and
    /// then once per period. Calling `start` again is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), LedgerdeskError> {
        if self.is_stopped() {
            return Err(stopped_error());
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for source in DataSource::ALL {
            let shared = Arc::clone(&self.shared);
            let period = self.schedule.period(source);
            let jitter = self.schedule.jitter;
            self.tracker.spawn(poll_loop(shared, source, period, jitter));
        }
        info!(
            dashboard_secs = self.schedule.dashboard.as_secs_f64(),
            overdue_secs = self.schedule.overdue.as_secs_f64(),
            opportunities_secs = self.schedule.opportunities.as_secs_f64(),
            jitter_ms = self.schedule.jitter.as_millis() as u64,
            "metrics polling started"
        );
        Ok(())
    }

    /// Cancel every loop and any fetch in flight. Terminal: the aggregator
    /// cannot be restarted and results arriving afterwards are dropped.
    pub fn stop(&self) {
        if !self.shared.cancel.is_cancelled() {
            info!("metrics polling stopping");
        }
        self.shared.cancel.cancel();
        self.tracker.close();
    }

    /// Resolves once every polling loop has exited after [`stop`](Self::stop).
    pub async fn stopped(&self) {
        self.tracker.wait().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Poll one source now, outside its schedule.
    pub async fn refresh(&self, source: DataSource) -> Result<(), LedgerdeskError> {
        self.shared.poll(source).await
    }

    /// Poll all three sources concurrently and report each outcome.
    pub async fn refresh_all(&self) -> Vec<(DataSource, Result<(), LedgerdeskError>)> {
        let (dashboard, overdue, opportunities) = tokio::join!(
            self.shared.poll(DataSource::DashboardMetrics),
            self.shared.poll(DataSource::OverdueInvoices),
            self.shared.poll(DataSource::ClosedOpportunities),
        );
        vec![
            (DataSource::DashboardMetrics, dashboard),
            (DataSource::OverdueInvoices, overdue),
            (DataSource::ClosedOpportunities, opportunities),
        ]
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dashboard: self.shared.dashboard.value(),
            overdue: self.shared.overdue.value(),
            opportunities: self.shared.opportunities.value(),
        }
    }

    pub fn dashboard(&self) -> Arc<DashboardMetrics> {
        self.shared.dashboard.value()
    }

    pub fn overdue(&self) -> Arc<Vec<OverdueInvoice>> {
        self.shared.overdue.value()
    }

    pub fn opportunities(&self) -> Arc<Vec<ClosedOpportunity>> {
        self.shared.opportunities.value()
    }

    pub fn health(&self, source: DataSource) -> SourceHealth {
        match source {
            DataSource::DashboardMetrics => self.shared.dashboard.health(),
            DataSource::OverdueInvoices => self.shared.overdue.health(),
            DataSource::ClosedOpportunities => self.shared.opportunities.health(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for MetricsAggregator {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

fn jitter_delay(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

async fn poll_loop(shared: Arc<Shared>, source: DataSource, period: Duration, jitter: Duration) {
    let cancel = shared.cancel.clone();
    let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
    // A slow fetch pushes this source's next tick back instead of bursting.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let delay = jitter_delay(jitter);
        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        // Failures are already logged and published; the next tick retries.
        if shared.poll(source).await.is_err() && cancel.is_cancelled() {
            break;
        }
    }
    debug!(%source, "poll loop stopped");
}
