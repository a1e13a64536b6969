// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator actions turned into outbound frames.
//!
//! Every action runs the same three steps: validate locally, append a user
//! entry describing the action, then send the command frame. The entry is
//! appended before the send is attempted, so it stays in the transcript even
//! when the send is rejected and always precedes any reply to it.

use std::sync::Arc;

use ledgerdesk_channel::ConnectionManager;
use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::invoice::InvoicePreview;
use ledgerdesk_core::metrics::{ClosedOpportunity, OverdueInvoice};
use ledgerdesk_core::types::{EntryPayload, Origin, ReminderMethod, StructuredEvent};

use crate::log::ConversationLog;

/// Outcome of an action that passed validation.
#[derive(Debug)]
pub struct Dispatched {
    /// Sequence of the user entry appended for the action.
    pub sequence: u64,
    /// Result of the send. `Err` means the operator must be told it failed.
    pub sent: Result<(), LedgerdeskError>,
}

impl Dispatched {
    pub fn is_sent(&self) -> bool {
        self.sent.is_ok()
    }
}

/// An outbound command and the transcript text that stands for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub log_text: String,
    pub frame: String,
}

impl Command {
    /// Free text, sent and logged verbatim.
    pub fn message(text: &str) -> Result<Self, LedgerdeskError> {
        if text.trim().is_empty() {
            return Err(LedgerdeskError::InvalidAction(
                "message text is empty".to_string(),
            ));
        }
        Ok(Self {
            log_text: text.to_string(),
            frame: text.to_string(),
        })
    }

    /// `approveAndSendInvoice: <json>` carrying the preview as received.
    pub fn approve_invoice(preview: &InvoicePreview) -> Result<Self, LedgerdeskError> {
        if preview.invoice_id.trim().is_empty() {
            return Err(LedgerdeskError::InvalidAction(
                "invoice preview has no invoice id".to_string(),
            ));
        }
        let event = StructuredEvent::InvoicePreview(preview.clone());
        let json = serde_json::to_string(&event)
            .map_err(|e| LedgerdeskError::Internal(format!("encode invoice preview: {e}")))?;
        Ok(Self {
            log_text: format!("Approve and send invoice {}", preview.invoice_id),
            frame: format!("approveAndSendInvoice: {json}"),
        })
    }

    pub fn generate_invoice(opportunity: &ClosedOpportunity) -> Result<Self, LedgerdeskError> {
        let name = opportunity.opportunity_name.trim();
        if name.is_empty() {
            return Err(LedgerdeskError::InvalidAction(
                "opportunity has no name".to_string(),
            ));
        }
        let text = format!("Generate Invoice for Opportunity {name}");
        Ok(Self {
            log_text: text.clone(),
            frame: text,
        })
    }

    /// Methods are deduplicated and listed in a fixed order.
    pub fn send_reminder(
        invoice: &OverdueInvoice,
        methods: &[ReminderMethod],
    ) -> Result<Self, LedgerdeskError> {
        if invoice.invoice_id.trim().is_empty() {
            return Err(LedgerdeskError::InvalidAction(
                "overdue invoice has no invoice id".to_string(),
            ));
        }
        let mut methods = methods.to_vec();
        methods.sort();
        methods.dedup();
        if methods.is_empty() {
            return Err(LedgerdeskError::InvalidAction(
                "select at least one reminder method".to_string(),
            ));
        }
        let via = methods
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!("Send reminder to invoice {} via {via}", invoice.invoice_id);
        Ok(Self {
            log_text: text.clone(),
            frame: text,
        })
    }
}

/// Translates operator actions into log entries and frames.
#[derive(Clone)]
pub struct ActionDispatcher {
    connection: Arc<ConnectionManager>,
    log: ConversationLog,
}

impl ActionDispatcher {
    pub fn new(connection: Arc<ConnectionManager>, log: ConversationLog) -> Self {
        Self { connection, log }
    }

    pub async fn send_user_message(&self, text: &str) -> Result<Dispatched, LedgerdeskError> {
        self.dispatch(Command::message(text)?).await
    }

    pub async fn approve_invoice(
        &self,
        preview: &InvoicePreview,
    ) -> Result<Dispatched, LedgerdeskError> {
        self.dispatch(Command::approve_invoice(preview)?).await
    }

    pub async fn generate_invoice(
        &self,
        opportunity: &ClosedOpportunity,
    ) -> Result<Dispatched, LedgerdeskError> {
        self.dispatch(Command::generate_invoice(opportunity)?).await
    }

    /// Rejected before anything is logged or sent when `methods` is empty.
    pub async fn send_reminder(
        &self,
        invoice: &OverdueInvoice,
        methods: &[ReminderMethod],
    ) -> Result<Dispatched, LedgerdeskError> {
        self.dispatch(Command::send_reminder(invoice, methods)?).await
    }

    async fn dispatch(&self, command: Command) -> Result<Dispatched, LedgerdeskError> {
        let sequence = self
            .log
            .append(Origin::User, EntryPayload::Text(command.log_text));

        let sent = match self.connection.current_handle() {
            Some(handle) => self.connection.send(handle, command.frame).await,
            None => Err(LedgerdeskError::NotConnected),
        };

        match &sent {
            Ok(()) => self.log.mark_awaiting_reply(sequence),
            Err(e) => tracing::warn!(sequence, error = %e, "action not sent"),
        }
        Ok(Dispatched { sequence, sent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_command_embeds_preview_json() {
        let preview: InvoicePreview =
            serde_json::from_str(r#"{"invoice_id":"INV-7","currency":"USD","memo":"q3"}"#)
                .unwrap();
        let command = Command::approve_invoice(&preview).unwrap();
        assert_eq!(command.log_text, "Approve and send invoice INV-7");

        let json = command
            .frame
            .strip_prefix("approveAndSendInvoice: ")
            .expect("command prefix");
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["type"], "invoice_preview");
        assert_eq!(value["invoice_id"], "INV-7");
        assert_eq!(value["memo"], "q3");
    }

    #[test]
    fn reminder_methods_are_sorted_and_deduplicated() {
        let invoice = OverdueInvoice {
            invoice_id: "INV-3".into(),
            ..Default::default()
        };
        let command = Command::send_reminder(
            &invoice,
            &[
                ReminderMethod::Whatsapp,
                ReminderMethod::Email,
                ReminderMethod::Whatsapp,
            ],
        )
        .unwrap();
        assert_eq!(command.frame, "Send reminder to invoice INV-3 via email, whatsapp");
    }

    #[test]
    fn reminder_without_methods_is_invalid() {
        let invoice = OverdueInvoice {
            invoice_id: "INV-3".into(),
            ..Default::default()
        };
        assert!(matches!(
            Command::send_reminder(&invoice, &[]),
            Err(LedgerdeskError::InvalidAction(_))
        ));
    }

    #[test]
    fn generation_uses_opportunity_name() {
        let opp = ClosedOpportunity {
            opportunity_name: "Acme renewal".into(),
            ..Default::default()
        };
        let command = Command::generate_invoice(&opp).unwrap();
        assert_eq!(command.frame, "Generate Invoice for Opportunity Acme renewal");
        assert_eq!(command.log_text, command.frame);
    }

    #[test]
    fn blank_inputs_are_invalid() {
        assert!(Command::message("   ").is_err());
        assert!(Command::generate_invoice(&ClosedOpportunity::default()).is_err());
        assert!(Command::approve_invoice(&InvoicePreview::default()).is_err());
    }
}
