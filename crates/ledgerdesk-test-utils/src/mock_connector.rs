// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable in-memory duplex connector.
//!
//! `MockConnector` implements [`Connector`] without any network. Tests push
//! inbound frames into the live link, read back every frame the code under
//! test sent, and simulate remote closes, link failures, refused connects,
//! connects that hang until released and an agent that answers every write.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use tokio::sync::{Mutex, Notify, watch};

use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::traits::{Adapter, Connector, DuplexLink};

type InboundTx = mpsc::UnboundedSender<Result<String, LedgerdeskError>>;

/// In-memory connector for deterministic connection tests.
pub struct MockConnector {
    inbound: Mutex<Option<InboundTx>>,
    sent: Arc<Mutex<Vec<String>>>,
    sent_notify: Arc<Notify>,
    endpoints: Mutex<Vec<String>>,
    connects: AtomicUsize,
    refuse: AtomicBool,
    fail_sends: Arc<AtomicBool>,
    echo: Arc<AtomicBool>,
    gate: watch::Sender<bool>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            inbound: Mutex::new(None),
            sent: Arc::new(Mutex::new(Vec::new())),
            sent_notify: Arc::new(Notify::new()),
            endpoints: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            fail_sends: Arc::new(AtomicBool::new(false)),
            echo: Arc::new(AtomicBool::new(false)),
            gate: watch::Sender::new(true),
        }
    }

    /// Deliver `frame` on the most recently opened link.
    ///
    /// Returns `false` when no link is live.
    pub async fn inject(&self, frame: impl Into<String>) -> bool {
        match self.inbound.lock().await.as_ref() {
            Some(tx) => tx.unbounded_send(Ok(frame.into())).is_ok(),
            None => false,
        }
    }

    /// Fail the live link with a transport error.
    pub async fn fail_link(&self, message: &str) -> bool {
        match self.inbound.lock().await.take() {
            Some(tx) => tx
                .unbounded_send(Err(LedgerdeskError::transport(message)))
                .is_ok(),
            None => false,
        }
    }

    /// Close the live link from the remote side. The inbound stream ends.
    pub async fn close_remote(&self) {
        self.inbound.lock().await.take();
    }

    /// Make subsequent `connect` calls fail (`true`) or succeed (`false`).
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Make writes on every link fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Answer every written frame with `admin bot: reply to <frame>`, queued
    /// on the same link before the write completes.
    pub fn echo_replies(&self, echo: bool) {
        self.echo.store(echo, Ordering::SeqCst);
    }

    /// Hold every `connect` call until [`release_connects`](Self::release_connects).
    pub fn hold_connects(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_connects(&self) {
        self.gate.send_replace(true);
    }

    /// Every frame written to any link so far, in order.
    pub async fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    /// Wait until at least `count` frames were sent, or two seconds pass.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<String> {
        let wait = async {
            loop {
                let notified = self.sent_notify.notified();
                {
                    let sent = self.sent.lock().await;
                    if sent.len() >= count {
                        return sent.clone();
                    }
                }
                notified.await;
            }
        };
        match tokio::time::timeout(Duration::from_secs(2), wait).await {
            Ok(sent) => sent,
            Err(_) => self.sent_frames().await,
        }
    }

    /// Number of `connect` calls that reached the connector.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Endpoints passed to `connect`, in call order.
    pub async fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().await.clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for MockConnector {
    fn name(&self) -> &str {
        "mock-connector"
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<DuplexLink, LedgerdeskError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().await.push(endpoint.to_string());

        let mut gate = self.gate.subscribe();
        // The sender lives in `self`, so the wait only ends on release.
        let _ = gate.wait_for(|open| *open).await;

        if self.refuse.load(Ordering::SeqCst) {
            return Err(LedgerdeskError::transport(format!(
                "connection refused: {endpoint}"
            )));
        }

        let (tx, rx) = mpsc::unbounded();
        let echo_tx = tx.clone();
        *self.inbound.lock().await = Some(tx);

        let sent = Arc::clone(&self.sent);
        let notify = Arc::clone(&self.sent_notify);
        let fail_sends = Arc::clone(&self.fail_sends);
        let echo = Arc::clone(&self.echo);
        let sink = futures::sink::unfold((), move |(), frame: String| {
            let sent = Arc::clone(&sent);
            let notify = Arc::clone(&notify);
            let fail = fail_sends.load(Ordering::SeqCst);
            let reply = echo
                .load(Ordering::SeqCst)
                .then(|| (echo_tx.clone(), format!("admin bot: reply to {frame}")));
            async move {
                if fail {
                    return Err(LedgerdeskError::transport("write failed"));
                }
                if let Some((tx, reply)) = reply {
                    let _ = tx.unbounded_send(Ok(reply));
                }
                sent.lock().await.push(frame);
                notify.notify_waiters();
                Ok(())
            }
        });

        Ok(DuplexLink {
            sink: Box::pin(sink),
            stream: rx.boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;

    #[tokio::test]
    async fn link_carries_frames_both_ways() {
        let connector = MockConnector::new();
        let mut link = connector.connect("ws://mock/ws").await.unwrap();

        assert!(connector.inject("admin bot: hi").await);
        let frame = link.stream.next().await.unwrap().unwrap();
        assert_eq!(frame, "admin bot: hi");

        link.sink.send("hello".to_string()).await.unwrap();
        assert_eq!(connector.sent_frames().await, vec!["hello"]);
        assert_eq!(connector.endpoints().await, vec!["ws://mock/ws"]);
    }

    #[tokio::test]
    async fn echo_queues_a_reply_per_write() {
        let connector = MockConnector::new();
        connector.echo_replies(true);
        let mut link = connector.connect("ws://mock").await.unwrap();

        link.sink.send("hi".to_string()).await.unwrap();
        let reply = link.stream.next().await.unwrap().unwrap();
        assert_eq!(reply, "admin bot: reply to hi");
    }

    #[tokio::test]
    async fn remote_close_ends_stream() {
        let connector = MockConnector::new();
        let mut link = connector.connect("ws://mock").await.unwrap();
        connector.close_remote().await;
        assert!(link.stream.next().await.is_none());
        assert!(!connector.inject("late").await);
    }

    #[tokio::test]
    async fn refused_connect_returns_transport_error() {
        let connector = MockConnector::new();
        connector.refuse_connections(true);
        let err = connector.connect("ws://mock").await.unwrap_err();
        assert!(err.is_send_failure());
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn failed_sends_surface_as_errors() {
        let connector = MockConnector::new();
        let mut link = connector.connect("ws://mock").await.unwrap();
        connector.fail_sends(true);
        assert!(link.sink.send("x".to_string()).await.is_err());
        assert!(connector.sent_frames().await.is_empty());
    }
}
