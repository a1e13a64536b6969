// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of console state.
//!
//! Every function here is a pure function of its arguments. Missing optional
//! fields render as fixed placeholders so a sparse payload never fails to
//! display.

use std::fmt::Write as _;

use ledgerdesk_core::invoice::InvoicePreview;
use ledgerdesk_core::metrics::{ClosedOpportunity, DashboardMetrics, DataSource, OverdueInvoice};
use ledgerdesk_core::types::{
    ConnectionState, ConnectionStatus, ConversationEntry, EntryPayload, Origin, StructuredEvent,
};
use ledgerdesk_metrics::{DerivedMetrics, MetricsSnapshot, SourceHealth};

use crate::overlay::{FilterMenu, ReminderPicker, StatusFilter};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_ADDRESS: &str = "Address not available";
pub const DEFAULT_CURRENCY: &str = "USD";

const BAR_WIDTH: usize = 20;

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

pub fn money(amount: f64, currency: &str) -> String {
    format!("{currency} {amount:.2}")
}

fn speaker(origin: Origin) -> &'static str {
    match origin {
        Origin::User => "you",
        Origin::Agent => "agent",
    }
}

/// One transcript entry. The payload match is the single place that decides
/// how each entry kind looks.
pub fn entry(entry: &ConversationEntry) -> String {
    let who = speaker(entry.origin);
    match &entry.payload {
        EntryPayload::Text(text) => format!("[{}] {who}: {text}", entry.sequence),
        EntryPayload::Event(StructuredEvent::InvoicePreview(preview)) => format!(
            "[{}] {who}: invoice preview\n{}",
            entry.sequence,
            invoice_preview(preview, entry.sequence)
        ),
    }
}

pub fn transcript(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return "(no messages yet)".to_string();
    }
    entries.iter().map(entry).collect::<Vec<_>>().join("\n")
}

pub fn invoice_preview(preview: &InvoicePreview, sequence: u64) -> String {
    let currency = preview
        .currency
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(DEFAULT_CURRENCY);
    let mut out = String::new();

    let id = if preview.invoice_id.is_empty() {
        NOT_AVAILABLE
    } else {
        preview.invoice_id.as_str()
    };
    let _ = writeln!(out, "    Invoice {id}  ({})", or_na(preview.status.as_deref()));
    let _ = writeln!(
        out,
        "    Issued: {}   Due: {}",
        or_na(preview.issue_date.as_deref()),
        or_na(preview.due_date.as_deref())
    );

    let account = preview.account.as_ref();
    let _ = writeln!(
        out,
        "    Bill to: {}",
        or_na(account.and_then(|a| a.name.as_deref()))
    );
    let address = account
        .and_then(|a| a.billing_address.as_ref())
        .map(|addr| {
            [&addr.street, &addr.city, &addr.postal_code]
                .into_iter()
                .filter_map(|part| part.as_deref())
                .filter(|part| !part.trim().is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty());
    let _ = writeln!(out, "    Address: {}", address.as_deref().unwrap_or(NO_ADDRESS));
    let _ = writeln!(
        out,
        "    Phone: {}",
        or_na(account.and_then(|a| a.phone.as_deref()))
    );

    let contact = preview.contact.as_ref();
    let _ = writeln!(
        out,
        "    Contact: {} / {}",
        or_na(contact.and_then(|c| c.email.as_deref())),
        or_na(contact.and_then(|c| c.phone.as_deref()))
    );

    if preview.line_items.is_empty() {
        let _ = writeln!(out, "    (no line items)");
    } else {
        let _ = writeln!(
            out,
            "    {:<28} {:>6} {:>14} {:>14}",
            "Product", "Qty", "Unit price", "Total"
        );
        for item in &preview.line_items {
            let product = match item.code.as_deref() {
                Some(code) if !code.is_empty() => format!("{} ({code})", item.product),
                _ => item.product.clone(),
            };
            let unit = item
                .unit_price
                .map_or_else(|| NOT_AVAILABLE.to_string(), |p| money(p, currency));
            let total = item
                .total
                .map_or_else(|| NOT_AVAILABLE.to_string(), |t| money(t, currency));
            let _ = writeln!(out, "    {product:<28} {:>6} {unit:>14} {total:>14}", item.qty);
        }
    }
    let _ = writeln!(
        out,
        "    Total due: {}",
        money(preview.effective_total(), currency)
    );
    let _ = write!(out, "    /approve {sequence} to approve and send");
    out
}

pub fn connection_status(status: &ConnectionStatus, endpoint: &str) -> String {
    let state = match status.state {
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "connected",
        ConnectionState::Closed if status.generation == 0 => "not connected",
        ConnectionState::Closed => "disconnected (use /reconnect)",
        ConnectionState::Error => "connection error (use /reconnect)",
    };
    format!("agent {endpoint}: {state}")
}

fn bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub fn dashboard(snapshot: &MetricsSnapshot) -> String {
    dashboard_summary(&snapshot.dashboard, &snapshot.derived())
}

pub fn dashboard_summary(metrics: &DashboardMetrics, derived: &DerivedMetrics) -> String {
    let DerivedMetrics {
        breakdown,
        risk,
        totals,
    } = derived;
    let stats = &metrics.invoice_stats;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Today's revenue: {}",
        money(totals.today_revenue, DEFAULT_CURRENCY)
    );
    let _ = writeln!(
        out,
        "Invoices: {} totalling {}  (collected {}, outstanding {})",
        totals.invoice_count,
        money(totals.invoice_amount, DEFAULT_CURRENCY),
        money(totals.collected_amount, DEFAULT_CURRENCY),
        money(totals.outstanding_amount, DEFAULT_CURRENCY)
    );
    let _ = writeln!(out, "Status breakdown ({} charted):", breakdown.total);
    for segment in &breakdown.segments {
        let _ = writeln!(
            out,
            "  {:<11} {:>5} {} {:>5.1}%  {}",
            segment.status.to_string(),
            segment.count,
            bar(segment.percentage),
            segment.percentage,
            money(stats.get(segment.status).amount, DEFAULT_CURRENCY)
        );
    }
    let _ = writeln!(
        out,
        "  {:<11} {:>5}  (not charted)",
        "fail", stats.fail.count
    );
    let _ = write!(
        out,
        "Overdue risk: {} ({:.0}% of invoices, needle at {:.0} deg)",
        risk.band,
        risk.ratio * 100.0,
        risk.needle_angle
    );
    out
}

pub fn overdue_invoices(invoices: &[OverdueInvoice]) -> String {
    if invoices.is_empty() {
        return "No overdue recurring invoices.".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<16} {:<12} {:>12}  Customer",
        "No.", "Invoice ID", "Issued", "Overdue days"
    );
    for (index, invoice) in invoices.iter().enumerate() {
        let issued = invoice.created_at.get(..10).unwrap_or(&invoice.created_at);
        let _ = writeln!(
            out,
            "{:>3}  {:<16} {:<12} {:>12}  {}",
            index + 1,
            invoice.invoice_id,
            or_na(Some(issued)),
            invoice.overdue_days,
            or_na(invoice.customer_name.as_deref())
        );
    }
    let _ = write!(out, "Use /remind <no.> to send a reminder.");
    out
}

pub fn opportunities(list: &[ClosedOpportunity], filter: &StatusFilter) -> String {
    let visible = filter.apply(list);
    let mut out = String::new();
    let _ = writeln!(out, "Closed opportunities ({}):", filter.label());
    if visible.is_empty() {
        let _ = write!(out, "  none");
        return out;
    }
    for (index, opp) in visible.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<32} {:<12} {}",
            index + 1,
            opp.opportunity_name,
            or_na(Some(opp.date.as_str())),
            or_na(Some(opp.status.as_str()))
        );
    }
    let _ = write!(out, "Use /generate <no.> to generate an invoice.");
    out
}

pub fn filter_menu(menu: &FilterMenu, current: &StatusFilter) -> String {
    let mut out = String::from("Filter closed opportunities by status:\n");
    for (index, option) in menu.options().iter().enumerate() {
        let marker = if current.label() == option.as_str() { "*" } else { " " };
        let _ = writeln!(out, " {marker} {index}. {option}");
    }
    let _ = write!(out, "Choose with /filter <no.|status>, or /cancel.");
    out
}

pub fn reminder_picker(picker: &ReminderPicker) -> String {
    let mut out = format!("Send reminder for invoice {}\n", picker.invoice().invoice_id);
    for method in ledgerdesk_core::types::ReminderMethod::ALL {
        let mark = if picker.is_selected(method) { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {method}");
    }
    let _ = write!(out, "Toggle with /method <email|whatsapp>, then /send or /cancel.");
    out
}

pub fn source_health(source: DataSource, health: &SourceHealth) -> String {
    let refreshed = health
        .refreshed_at
        .map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S UTC").to_string());
    match &health.last_error {
        Some(error) if health.is_failing() => format!(
            "{source}: last refresh {refreshed}, failing ({} in a row): {error}",
            health.consecutive_failures
        ),
        _ => format!("{source}: last refresh {refreshed}"),
    }
}

pub const HELP: &str = "\
Type a message to send it to the agent. Commands:
  /approve [no.]          approve and send the latest (or given) invoice preview
  /overdue                list overdue recurring invoices
  /remind <no.> [method]  send a payment reminder (opens the method picker)
  /method <name>          toggle a reminder method in the picker
  /send | /cancel         confirm or dismiss the open picker
  /opportunities          list closed opportunities
  /filter [no.|status]    filter closed opportunities by status
  /generate <no.>         generate an invoice for a closed opportunity
  /dashboard              revenue, status breakdown and overdue risk
  /refresh [source]       poll dashboard, overdue or opportunities now
  /status                 connection and data freshness
  /transcript             show the whole conversation
  /reconnect              open a new agent connection
  /help | /quit";
