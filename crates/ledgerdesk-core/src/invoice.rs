// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice preview payload sent by the remote agent.
//!
//! Every field is optional on the wire. Absent nested entities decode to
//! `None` and render as placeholders; an absent or `null` `line_items`
//! decodes to an empty list. Fields this model does not name are kept in `extra` so the
//! approval command can forward the payload exactly as received.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Draft invoice produced by the agent for operator approval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePreview {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub invoice_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub line_items: Vec<LineItem>,

    /// Unrecognized fields, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Billed account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<BillingAddress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contact person on the billed account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of the invoice table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub product: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "crate::de::null_default")]
    pub qty: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoicePreview {
    /// Sum of line totals. Used when the agent omits `total_amount`.
    pub fn line_total(&self) -> f64 {
        self.line_items
            .iter()
            .filter_map(|item| item.total)
            .fold(0.0, |acc, total| acc + total)
    }

    /// `total_amount` when present, otherwise the sum of line totals.
    pub fn effective_total(&self) -> f64 {
        self.total_amount.unwrap_or_else(|| self.line_total())
    }
}
