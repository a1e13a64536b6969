// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and connection types shared by the channel, conversation and
//! console crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::invoice::InvoicePreview;

/// Who produced a conversation entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The operator at the console.
    User,
    /// The remote agent on the other end of the duplex connection.
    Agent,
}

/// Coarse kind of an entry, derived from its payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    Text,
    StructuredEvent,
}

/// A structured domain event recognized by its `type` discriminator.
///
/// Serializes back to the same tagged shape it was decoded from, so the
/// approval command can forward it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredEvent {
    InvoicePreview(InvoicePreview),
}

impl StructuredEvent {
    /// Discriminator value carried on the wire.
    pub fn discriminator(&self) -> &'static str {
        match self {
            StructuredEvent::InvoicePreview(_) => "invoice_preview",
        }
    }
}

/// Payload of a conversation entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPayload {
    Text(String),
    Event(StructuredEvent),
}

impl EntryPayload {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryPayload::Text(_) => EntryKind::Text,
            EntryPayload::Event(_) => EntryKind::StructuredEvent,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntryPayload::Text(text) => Some(text),
            EntryPayload::Event(_) => None,
        }
    }

    pub fn as_invoice_preview(&self) -> Option<&InvoicePreview> {
        match self {
            EntryPayload::Event(StructuredEvent::InvoicePreview(preview)) => Some(preview),
            EntryPayload::Text(_) => None,
        }
    }
}

/// One immutable unit of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    /// Position in the log, assigned at append time. Starts at 1.
    pub sequence: u64,
    pub origin: Origin,
    pub payload: EntryPayload,
}

impl ConversationEntry {
    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }
}

/// Lifecycle state of the single duplex connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Error,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }
}

/// Connection state tagged with the generation of the handle it belongs to.
///
/// Generation 0 means no connection has been opened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub generation: u64,
    pub state: ConnectionState,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            generation: 0,
            state: ConnectionState::Closed,
        }
    }
}

/// Delivery channel for an overdue-payment reminder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Whatsapp,
}

impl ReminderMethod {
    pub const ALL: [ReminderMethod; 2] = [ReminderMethod::Email, ReminderMethod::Whatsapp];
}
