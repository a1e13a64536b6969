// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ledgerdesk operator console.
//!
//! This crate provides the error type, the domain types shared by every other
//! crate (conversation entries, invoice previews, metrics snapshots) and the
//! adapter traits implemented for the two external collaborators: the remote
//! agent's duplex connection and the analytics backend.

pub mod de;
pub mod error;
pub mod invoice;
pub mod metrics;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LedgerdeskError;
pub use invoice::InvoicePreview;
pub use metrics::{ClosedOpportunity, DashboardMetrics, DataSource, OverdueInvoice};
pub use types::{
    ConnectionState, ConnectionStatus, ConversationEntry, EntryKind, EntryPayload, Origin,
    ReminderMethod, StructuredEvent,
};

pub use traits::{Adapter, Connector, DuplexLink, MetricsBackend};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledgerdesk_error_has_all_variants() {
        let _config = LedgerdeskError::Config("test".into());
        let _transport = LedgerdeskError::transport("refused");
        let _not_connected = LedgerdeskError::NotConnected;
        let _invalid = LedgerdeskError::InvalidAction("empty".into());
        let _fetch = LedgerdeskError::Fetch {
            source_name: "dashboard_metrics".into(),
            message: "500".into(),
            source: None,
        };
        let _timeout = LedgerdeskError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = LedgerdeskError::Internal("test".into());
    }

    #[test]
    fn send_failures_are_classified() {
        assert!(LedgerdeskError::NotConnected.is_send_failure());
        assert!(LedgerdeskError::transport("reset").is_send_failure());
        assert!(!LedgerdeskError::InvalidAction("x".into()).is_send_failure());
    }

    #[test]
    fn connection_state_display_round_trip() {
        use std::str::FromStr;

        for state in [
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
            ConnectionState::Error,
        ] {
            let parsed = ConnectionState::from_str(&state.to_string()).expect("should parse back");
            assert_eq!(state, parsed);
        }
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
    }

    #[test]
    fn default_status_is_closed_generation_zero() {
        let status = ConnectionStatus::default();
        assert_eq!(status.generation, 0);
        assert_eq!(status.state, ConnectionState::Closed);
    }

    #[test]
    fn structured_event_serializes_with_discriminator() {
        let event = StructuredEvent::InvoicePreview(InvoicePreview {
            invoice_id: "INV-1".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&event).expect("should serialize");
        assert_eq!(json["type"], event.discriminator());
        assert_eq!(json["invoice_id"], "INV-1");
        assert!(json["line_items"].as_array().is_some_and(|items| items.is_empty()));
    }

    #[test]
    fn payload_kind_matches_variant() {
        let text = EntryPayload::Text("hi".into());
        assert_eq!(text.kind(), EntryKind::Text);
        assert_eq!(text.as_text(), Some("hi"));
        assert!(text.as_invoice_preview().is_none());

        let event = EntryPayload::Event(StructuredEvent::InvoicePreview(InvoicePreview::default()));
        assert_eq!(event.kind(), EntryKind::StructuredEvent);
        assert!(event.as_invoice_preview().is_some());
    }

    #[test]
    fn reminder_method_parses_case_insensitively() {
        use std::str::FromStr;
        assert_eq!(ReminderMethod::from_str("WhatsApp").unwrap(), ReminderMethod::Whatsapp);
        assert_eq!(ReminderMethod::Email.to_string(), "email");
        assert!(ReminderMethod::from_str("pigeon").is_err());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_connector<T: Connector>() {}
        fn _assert_backend<T: MetricsBackend>() {}
    }
}
