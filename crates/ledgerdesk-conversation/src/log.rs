// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only conversation log.
//!
//! The log is the canonical transcript state. Entries are published through a
//! watch channel as an immutable `Arc<[ConversationEntry]>`, so observers see
//! whole snapshots and never a partially applied append.

use std::sync::Arc;

use tokio::sync::watch;

use ledgerdesk_core::invoice::InvoicePreview;
use ledgerdesk_core::types::{ConversationEntry, EntryPayload, Origin};

/// Immutable view of the log at one point in time.
pub type Transcript = Arc<[ConversationEntry]>;

/// Cloneable handle to one shared log.
#[derive(Clone)]
pub struct ConversationLog {
    entries: Arc<watch::Sender<Transcript>>,
    awaiting_reply: Arc<watch::Sender<bool>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(watch::Sender::new(Arc::from(Vec::new()))),
            awaiting_reply: Arc::new(watch::Sender::new(false)),
        }
    }

    /// A log that starts with one agent greeting entry.
    pub fn with_greeting(greeting: Option<&str>) -> Self {
        let log = Self::new();
        if let Some(text) = greeting.filter(|g| !g.trim().is_empty()) {
            log.append(Origin::Agent, EntryPayload::Text(text.to_string()));
        }
        log
    }

    /// Append at the tail and return the assigned sequence.
    ///
    /// Sequences start at 1 and increase by one per append, in call order.
    /// An agent entry clears the awaiting-reply indicator.
    pub fn append(&self, origin: Origin, payload: EntryPayload) -> u64 {
        let mut sequence = 0;
        self.entries.send_modify(|entries| {
            sequence = entries.last().map_or(1, |last| last.sequence + 1);
            let mut next = Vec::with_capacity(entries.len() + 1);
            next.extend_from_slice(entries);
            next.push(ConversationEntry {
                sequence,
                origin,
                payload,
            });
            *entries = Arc::from(next);

            // Flag updates happen under the entries lock so they are ordered
            // with appends.
            if origin == Origin::Agent {
                self.awaiting_reply
                    .send_if_modified(|waiting| std::mem::replace(waiting, false));
            }
        });

        tracing::trace!(sequence, %origin, "appended conversation entry");
        sequence
    }

    pub fn snapshot(&self) -> Transcript {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observe every append. The receiver starts at the current transcript.
    pub fn subscribe(&self) -> watch::Receiver<Transcript> {
        self.entries.subscribe()
    }

    /// Entry with the given sequence.
    pub fn get(&self, sequence: u64) -> Option<ConversationEntry> {
        let entries = self.entries.borrow();
        // Sequences are dense from 1, so the index is known.
        let index = usize::try_from(sequence.checked_sub(1)?).ok()?;
        entries.get(index).cloned()
    }

    /// Invoice preview carried by the entry at `sequence`, if it is one.
    pub fn find_preview(&self, sequence: u64) -> Option<InvoicePreview> {
        self.get(sequence)
            .and_then(|entry| entry.payload.as_invoice_preview().cloned())
    }

    /// Most recent invoice preview and its sequence.
    pub fn latest_preview(&self) -> Option<(u64, InvoicePreview)> {
        self.entries.borrow().iter().rev().find_map(|entry| {
            entry
                .payload
                .as_invoice_preview()
                .map(|preview| (entry.sequence, preview.clone()))
        })
    }

    /// Wait for a reply to the user entry at `sequence`.
    ///
    /// No-op when an agent entry after `sequence` is already in the log, so a
    /// reply that lands before the sender resumes is not waited for again.
    /// Cleared by the next agent entry.
    pub fn mark_awaiting_reply(&self, sequence: u64) {
        self.entries.send_if_modified(|entries| {
            let replied = entries
                .iter()
                .rev()
                .take_while(|entry| entry.sequence > sequence)
                .any(|entry| entry.origin == Origin::Agent);
            if !replied {
                self.awaiting_reply
                    .send_if_modified(|waiting| !std::mem::replace(waiting, true));
            }
            false
        });
    }

    pub fn is_awaiting_reply(&self) -> bool {
        *self.awaiting_reply.borrow()
    }

    pub fn subscribe_awaiting_reply(&self) -> watch::Receiver<bool> {
        self.awaiting_reply.subscribe()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationLog")
            .field("len", &self.len())
            .field("awaiting_reply", &self.is_awaiting_reply())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdesk_core::types::StructuredEvent;

    fn text(s: &str) -> EntryPayload {
        EntryPayload::Text(s.to_string())
    }

    fn preview(id: &str) -> EntryPayload {
        EntryPayload::Event(StructuredEvent::InvoicePreview(InvoicePreview {
            invoice_id: id.to_string(),
            ..Default::default()
        }))
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let log = ConversationLog::new();
        assert_eq!(log.append(Origin::User, text("a")), 1);
        assert_eq!(log.append(Origin::Agent, text("b")), 2);
        assert_eq!(log.append(Origin::User, text("c")), 3);

        let snapshot = log.snapshot();
        let seqs: Vec<u64> = snapshot.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(snapshot[1].origin, Origin::Agent);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_appends() {
        let log = ConversationLog::new();
        log.append(Origin::User, text("first"));
        let before = log.snapshot();
        log.append(Origin::User, text("second"));
        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }

    #[test]
    fn greeting_is_seeded_as_agent_entry() {
        let log = ConversationLog::with_greeting(Some("Hi, how can I help you?"));
        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].origin, Origin::Agent);
        assert_eq!(entries[0].payload.as_text(), Some("Hi, how can I help you?"));

        assert!(ConversationLog::with_greeting(None).is_empty());
        assert!(ConversationLog::with_greeting(Some("  ")).is_empty());
    }

    #[test]
    fn clones_share_the_same_log() {
        let log = ConversationLog::new();
        let other = log.clone();
        other.append(Origin::Agent, text("shared"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn preview_lookup_by_sequence_and_latest() {
        let log = ConversationLog::new();
        log.append(Origin::Agent, preview("INV-1"));
        log.append(Origin::User, text("ok"));
        log.append(Origin::Agent, preview("INV-2"));

        assert_eq!(log.find_preview(1).unwrap().invoice_id, "INV-1");
        assert!(log.find_preview(2).is_none());
        assert!(log.find_preview(0).is_none());
        assert!(log.find_preview(99).is_none());

        let (seq, latest) = log.latest_preview().unwrap();
        assert_eq!(seq, 3);
        assert_eq!(latest.invoice_id, "INV-2");
    }

    #[test]
    fn agent_entry_clears_awaiting_reply() {
        let log = ConversationLog::new();
        let sent = log.append(Origin::User, text("question"));
        log.mark_awaiting_reply(sent);
        assert!(log.is_awaiting_reply());
        log.append(Origin::User, text("still waiting"));
        assert!(log.is_awaiting_reply());
        log.append(Origin::Agent, text("reply"));
        assert!(!log.is_awaiting_reply());
    }

    #[test]
    fn reply_before_mark_leaves_indicator_clear() {
        let log = ConversationLog::new();
        let sent = log.append(Origin::User, text("hi"));
        log.append(Origin::Agent, text("reply to hi"));
        log.mark_awaiting_reply(sent);
        assert!(!log.is_awaiting_reply());

        let next = log.append(Origin::User, text("and then?"));
        log.mark_awaiting_reply(next);
        assert!(log.is_awaiting_reply());
    }

    #[test]
    fn marking_does_not_notify_transcript_observers() {
        let log = ConversationLog::new();
        let sent = log.append(Origin::User, text("hi"));
        let mut rx = log.subscribe();
        rx.borrow_and_update();
        log.mark_awaiting_reply(sent);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn subscribers_observe_appends() {
        let log = ConversationLog::new();
        let mut rx = log.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        log.append(Origin::User, text("hello"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
