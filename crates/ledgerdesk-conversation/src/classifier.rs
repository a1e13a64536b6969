// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of raw inbound frames.
//!
//! A frame becomes a structured event only when, after the origin prefix is
//! stripped, it decodes into a JSON object whose `type` names a known event
//! and whose fields match that event's shape. Everything else is plain text
//! carrying the stripped string. Classification never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use ledgerdesk_core::types::{EntryPayload, StructuredEvent};

/// `type` values that map to a [`StructuredEvent`] variant.
const KNOWN_EVENT_TYPES: &[&str] = &["invoice_preview"];

/// A whole frame wrapped in one markdown code fence, optionally language-tagged.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap()
});

/// Stateless frame classifier. Cloning is cheap enough to hand one to each
/// receive path.
#[derive(Debug, Clone)]
pub struct FrameClassifier {
    /// Matches one or more leading `<tag>:` prefixes. `None` when the tag is empty.
    prefix: Option<Regex>,
}

impl FrameClassifier {
    /// Build a classifier for agent frames prefixed with `origin_tag:`.
    ///
    /// The tag matches case-insensitively and any whitespace after the colon
    /// is stripped with it. An empty tag disables prefix stripping.
    pub fn new(origin_tag: &str) -> Self {
        let tag = origin_tag.trim();
        if tag.is_empty() {
            return Self { prefix: None };
        }
        let pattern = format!(r"(?i)^(?:{}:\s*)+", regex::escape(tag));
        match Regex::new(&pattern) {
            Ok(prefix) => Self {
                prefix: Some(prefix),
            },
            Err(e) => {
                tracing::warn!(origin_tag = tag, error = %e, "origin tag unusable, prefixes will not be stripped");
                Self { prefix: None }
            }
        }
    }

    /// `raw` with the origin prefix removed. Repeated prefixes are removed too,
    /// so stripping is idempotent.
    pub fn strip_origin<'a>(&self, raw: &'a str) -> &'a str {
        match &self.prefix {
            Some(prefix) => match prefix.find(raw) {
                Some(m) => &raw[m.end()..],
                None => raw,
            },
            None => raw,
        }
    }

    /// Classify one raw frame.
    pub fn classify(&self, raw: &str) -> EntryPayload {
        let stripped = self.strip_origin(raw);
        match self.decode_event(stripped) {
            Some(event) => EntryPayload::Event(event),
            None => EntryPayload::Text(stripped.to_string()),
        }
    }

    fn decode_event(&self, text: &str) -> Option<StructuredEvent> {
        let body = self.unfence(text).trim();
        if !body.starts_with('{') {
            return None;
        }

        let value: Value = serde_json::from_str(body).ok()?;
        let discriminator = value.as_object()?.get("type")?.as_str()?.to_owned();
        if !KNOWN_EVENT_TYPES.contains(&discriminator.as_str()) {
            tracing::trace!(%discriminator, "unrecognized event type, treating as text");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(%discriminator, error = %e, "malformed structured event, treating as text");
                None
            }
        }
    }

    /// Contents of a single enclosing markdown code fence, or `text` unchanged.
    fn unfence<'a>(&self, text: &'a str) -> &'a str {
        CODE_FENCE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map_or(text, |body| body.as_str())
    }
}

impl Default for FrameClassifier {
    fn default() -> Self {
        Self::new("admin bot")
    }
}
