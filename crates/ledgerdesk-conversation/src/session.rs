// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of connection, classifier, log and dispatcher for one console run.

use std::sync::Arc;

use ledgerdesk_channel::{ConnectionHandle, ConnectionManager};
use ledgerdesk_core::types::Origin;

use crate::classifier::FrameClassifier;
use crate::dispatcher::ActionDispatcher;
use crate::log::ConversationLog;

/// One operator session: a single log fed by whichever link is live.
///
/// The log outlives individual links; reconnecting keeps the transcript.
pub struct ConsoleSession {
    endpoint: String,
    connection: Arc<ConnectionManager>,
    classifier: FrameClassifier,
    log: ConversationLog,
    dispatcher: ActionDispatcher,
}

impl ConsoleSession {
    pub fn new(
        endpoint: impl Into<String>,
        connection: Arc<ConnectionManager>,
        classifier: FrameClassifier,
        log: ConversationLog,
    ) -> Self {
        let dispatcher = ActionDispatcher::new(Arc::clone(&connection), log.clone());
        Self {
            endpoint: endpoint.into(),
            connection,
            classifier,
            log,
            dispatcher,
        }
    }

    /// Open a link (replacing any current one) whose frames are classified
    /// and appended as agent entries in arrival order.
    pub fn connect(&self) -> ConnectionHandle {
        let classifier = self.classifier.clone();
        let log = self.log.clone();
        self.connection.open(&self.endpoint, move |raw| {
            let payload = classifier.classify(&raw);
            let kind = payload.kind();
            let sequence = log.append(Origin::Agent, payload);
            tracing::debug!(sequence, %kind, "agent frame received");
        })
    }

    pub fn disconnect(&self) {
        self.connection.close();
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }
}
