// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation values derived from a dashboard snapshot.
//!
//! Everything here is a pure function of [`DashboardMetrics`]; nothing is
//! cached. Any zero denominator yields zero rather than NaN.

use serde::Serialize;
use strum::Display;

use ledgerdesk_core::metrics::{DashboardMetrics, InvoiceStats, InvoiceStatus};

/// Statuses drawn in the breakdown chart, in drawing order. `fail` is not charted.
pub const CHARTED_STATUSES: [InvoiceStatus; 4] = [
    InvoiceStatus::Success,
    InvoiceStatus::Pending,
    InvoiceStatus::Processing,
    InvoiceStatus::Overdue,
];

const FULL_CIRCLE: f64 = 360.0;
const GAUGE_SWEEP: f64 = 180.0;

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

/// One slice of the status breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub status: InvoiceStatus,
    pub count: u64,
    /// Share of the charted total, 0..=100.
    pub percentage: f64,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    /// Sum of counts over [`CHARTED_STATUSES`].
    pub total: u64,
    pub segments: Vec<Segment>,
}

impl StatusBreakdown {
    pub fn from_stats(stats: &InvoiceStats) -> Self {
        let total: u64 = CHARTED_STATUSES.iter().map(|s| stats.get(*s).count).sum();
        let mut start_angle = 0.0;
        let segments = CHARTED_STATUSES
            .iter()
            .map(|status| {
                let count = stats.get(*status).count;
                let share = ratio(count as f64, total as f64);
                let segment = Segment {
                    status: *status,
                    count,
                    percentage: share * 100.0,
                    start_angle,
                    sweep_angle: share * FULL_CIRCLE,
                };
                start_angle += segment.sweep_angle;
                segment
            })
            .collect();
        Self { total, segments }
    }

    /// Percentage for `status`; zero for statuses that are not charted.
    pub fn percentage(&self, status: InvoiceStatus) -> f64 {
        self.segments
            .iter()
            .find(|s| s.status == status)
            .map_or(0.0, |s| s.percentage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn for_ratio(ratio: f64) -> Self {
        if ratio >= 0.75 {
            RiskBand::High
        } else if ratio >= 0.5 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// Position of the overdue-risk gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverdueRisk {
    /// Overdue count over the count of all five statuses, 0..=1.
    pub ratio: f64,
    pub band: RiskBand,
    /// Needle angle on a half-circle gauge, 0..=180.
    pub needle_angle: f64,
}

impl OverdueRisk {
    pub fn from_stats(stats: &InvoiceStats) -> Self {
        let ratio = ratio(stats.overdue.count as f64, stats.total_count() as f64).clamp(0.0, 1.0);
        Self {
            ratio,
            band: RiskBand::for_ratio(ratio),
            needle_angle: ratio * GAUGE_SWEEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub today_revenue: f64,
    pub invoice_count: u64,
    pub invoice_amount: f64,
    pub collected_amount: f64,
    /// Pending, processing and overdue amounts combined.
    pub outstanding_amount: f64,
}

impl Totals {
    pub fn from_metrics(metrics: &DashboardMetrics) -> Self {
        let stats = &metrics.invoice_stats;
        Self {
            today_revenue: metrics.today_revenue,
            invoice_count: stats.total_count(),
            invoice_amount: stats.total_amount(),
            collected_amount: stats.success.amount,
            outstanding_amount: stats.pending.amount
                + stats.processing.amount
                + stats.overdue.amount,
        }
    }
}

/// All derived values for one dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub breakdown: StatusBreakdown,
    pub risk: OverdueRisk,
    pub totals: Totals,
}

impl DerivedMetrics {
    pub fn from_metrics(metrics: &DashboardMetrics) -> Self {
        Self {
            breakdown: StatusBreakdown::from_stats(&metrics.invoice_stats),
            risk: OverdueRisk::from_stats(&metrics.invoice_stats),
            totals: Totals::from_metrics(metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdesk_core::metrics::StatusTotals;

    fn stats(pending: u64, processing: u64, success: u64, fail: u64, overdue: u64) -> InvoiceStats {
        let t = |count| StatusTotals {
            count,
            amount: count as f64 * 100.0,
        };
        InvoiceStats {
            pending: t(pending),
            processing: t(processing),
            success: t(success),
            fail: t(fail),
            overdue: t(overdue),
        }
    }

    #[test]
    fn three_pending_one_success_is_a_quarter_success() {
        let breakdown = StatusBreakdown::from_stats(&stats(3, 0, 1, 0, 0));
        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.percentage(InvoiceStatus::Success), 25.0);
        assert_eq!(breakdown.percentage(InvoiceStatus::Pending), 75.0);
        assert_eq!(breakdown.percentage(InvoiceStatus::Overdue), 0.0);
    }

    #[test]
    fn zero_counts_give_zero_percentages() {
        let breakdown = StatusBreakdown::from_stats(&InvoiceStats::default());
        assert_eq!(breakdown.total, 0);
        for segment in &breakdown.segments {
            assert_eq!(segment.percentage, 0.0);
            assert_eq!(segment.sweep_angle, 0.0);
        }
        let risk = OverdueRisk::from_stats(&InvoiceStats::default());
        assert_eq!(risk.ratio, 0.0);
        assert_eq!(risk.band, RiskBand::Low);
    }

    #[test]
    fn segments_tile_the_circle() {
        let breakdown = StatusBreakdown::from_stats(&stats(2, 1, 4, 7, 1));
        let last = breakdown.segments.last().unwrap();
        assert!((last.start_angle + last.sweep_angle - 360.0).abs() < 1e-9);
        assert_eq!(breakdown.segments[0].start_angle, 0.0);
        for pair in breakdown.segments.windows(2) {
            let end = pair[0].start_angle + pair[0].sweep_angle;
            assert!((pair[1].start_angle - end).abs() < 1e-9);
        }
    }

    #[test]
    fn failed_invoices_are_not_charted() {
        let breakdown = StatusBreakdown::from_stats(&stats(0, 0, 1, 9, 0));
        assert_eq!(breakdown.total, 1);
        assert_eq!(breakdown.percentage(InvoiceStatus::Success), 100.0);
        assert_eq!(breakdown.percentage(InvoiceStatus::Fail), 0.0);
    }

    #[test]
    fn risk_bands_follow_overdue_share() {
        assert_eq!(OverdueRisk::from_stats(&stats(3, 0, 0, 0, 1)).band, RiskBand::Low);
        assert_eq!(OverdueRisk::from_stats(&stats(1, 0, 0, 0, 1)).band, RiskBand::Medium);
        let high = OverdueRisk::from_stats(&stats(1, 0, 0, 0, 3));
        assert_eq!(high.band, RiskBand::High);
        assert_eq!(high.needle_angle, 135.0);
    }

    #[test]
    fn totals_split_collected_and_outstanding() {
        let metrics = DashboardMetrics {
            today_revenue: 42.0,
            invoice_stats: stats(1, 2, 3, 4, 5),
        };
        let totals = Totals::from_metrics(&metrics);
        assert_eq!(totals.invoice_count, 15);
        assert_eq!(totals.invoice_amount, 1500.0);
        assert_eq!(totals.collected_amount, 300.0);
        assert_eq!(totals.outstanding_amount, 800.0);
        assert_eq!(totals.today_revenue, 42.0);
    }
}
