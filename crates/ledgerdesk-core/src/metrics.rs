// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot types for the three polled backend data sources.
//!
//! Every field defaults when absent so a partially populated response still
//! decodes into a complete snapshot.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One of the three independently polled sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DataSource {
    DashboardMetrics,
    OverdueInvoices,
    ClosedOpportunities,
}

impl DataSource {
    pub const ALL: [DataSource; 3] = [
        DataSource::DashboardMetrics,
        DataSource::OverdueInvoices,
        DataSource::ClosedOpportunities,
    ];
}

/// Invoice payment status as tracked by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Processing,
    Success,
    Fail,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Processing,
        InvoiceStatus::Success,
        InvoiceStatus::Fail,
        InvoiceStatus::Overdue,
    ];
}

/// Count and summed amount for one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub amount: f64,
}

/// Per-status totals. Missing statuses decode as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStats {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub pending: StatusTotals,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub processing: StatusTotals,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub success: StatusTotals,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub fail: StatusTotals,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub overdue: StatusTotals,
}

impl InvoiceStats {
    pub fn get(&self, status: InvoiceStatus) -> StatusTotals {
        match status {
            InvoiceStatus::Pending => self.pending,
            InvoiceStatus::Processing => self.processing,
            InvoiceStatus::Success => self.success,
            InvoiceStatus::Fail => self.fail,
            InvoiceStatus::Overdue => self.overdue,
        }
    }

    /// Total invoice count across all five statuses.
    pub fn total_count(&self) -> u64 {
        InvoiceStatus::ALL.iter().map(|s| self.get(*s).count).sum()
    }

    /// Total amount across all five statuses.
    pub fn total_amount(&self) -> f64 {
        InvoiceStatus::ALL.iter().map(|s| self.get(*s).amount).sum()
    }
}

/// `GET /dashboard-metrics` snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub today_revenue: f64,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub invoice_stats: InvoiceStats,
}

/// One recurring invoice that is past due.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverdueInvoice {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub invoice_id: String,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub overdue_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// One closed sales opportunity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosedOpportunity {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub opportunity_name: String,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub date: String,
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub status: String,
}

/// `GET /overdue-recurring-invoices` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverdueInvoiceList {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub invoices: Vec<OverdueInvoice>,
}

/// `GET /closed-opportunities` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosedOpportunityList {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub opportunities: Vec<ClosedOpportunity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_decodes_to_zero_metrics() {
        let metrics: DashboardMetrics = serde_json::from_str("{}").unwrap();
        assert_eq!(metrics, DashboardMetrics::default());
        assert_eq!(metrics.invoice_stats.total_count(), 0);
    }

    #[test]
    fn partial_stats_fill_missing_statuses() {
        let json = r#"{"today_revenue": 12.5, "invoice_stats": {"pending": {"count": 3}}}"#;
        let metrics: DashboardMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.today_revenue, 12.5);
        assert_eq!(metrics.invoice_stats.pending.count, 3);
        assert_eq!(metrics.invoice_stats.pending.amount, 0.0);
        assert_eq!(metrics.invoice_stats.fail, StatusTotals::default());
    }

    #[test]
    fn list_bodies_default_to_empty() {
        let overdue: OverdueInvoiceList = serde_json::from_str("{}").unwrap();
        assert!(overdue.invoices.is_empty());
        let opps: ClosedOpportunityList =
            serde_json::from_str(r#"{"opportunities":[{"opportunity_name":"Automation"}]}"#)
                .unwrap();
        assert_eq!(opps.opportunities[0].opportunity_name, "Automation");
        assert_eq!(opps.opportunities[0].status, "");
    }

    #[test]
    fn null_dashboard_fields_decode_as_zero() {
        let json = r#"{"today_revenue": null, "invoice_stats": {"pending": null, "success": {"count": 2, "amount": null}}}"#;
        let metrics: DashboardMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.today_revenue, 0.0);
        assert_eq!(metrics.invoice_stats.pending, StatusTotals::default());
        assert_eq!(metrics.invoice_stats.success.count, 2);
        assert_eq!(metrics.invoice_stats.success.amount, 0.0);

        let empty: DashboardMetrics = serde_json::from_str(r#"{"invoice_stats": null}"#).unwrap();
        assert_eq!(empty, DashboardMetrics::default());
    }

    #[test]
    fn null_list_fields_decode_as_empty() {
        let overdue: OverdueInvoiceList = serde_json::from_str(
            r#"{"invoices":[{"invoice_id":"INV-4","created_at":null,"overdue_days":null}]}"#,
        )
        .unwrap();
        assert_eq!(overdue.invoices[0].invoice_id, "INV-4");
        assert_eq!(overdue.invoices[0].created_at, "");
        assert_eq!(overdue.invoices[0].overdue_days, 0);

        let none: OverdueInvoiceList = serde_json::from_str(r#"{"invoices":null}"#).unwrap();
        assert!(none.invoices.is_empty());

        let opps: ClosedOpportunityList = serde_json::from_str(
            r#"{"opportunities":[{"opportunity_name":"Audit","date":null,"status":null}]}"#,
        )
        .unwrap();
        assert_eq!(opps.opportunities[0].date, "");
        let none: ClosedOpportunityList =
            serde_json::from_str(r#"{"opportunities":null}"#).unwrap();
        assert!(none.opportunities.is_empty());
    }

    #[test]
    fn invoice_status_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(InvoiceStatus::from_str("Overdue").unwrap(), InvoiceStatus::Overdue);
        assert_eq!(InvoiceStatus::Success.to_string(), "success");
    }
}
