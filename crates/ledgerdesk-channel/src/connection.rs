// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle of the single duplex connection to the remote agent.
//!
//! [`ConnectionManager`] owns at most one live link. Each `open` gets a new
//! generation number; every status update carries the generation of the link
//! that produced it and is dropped if a newer generation has already been
//! published. A link that was torn down can therefore never overwrite the
//! status of its successor.
//!
//! State machine per generation:
//!
//! ```text
//! connecting --ok--> open --remote close--> closed
//!     |               \---read/write error--> error
//!     \--fail/timeout--> error
//! any --close()--> closed
//! ```
//!
//! There is no automatic reconnect and no outbound buffering.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::traits::Connector;
use ledgerdesk_core::types::{ConnectionState, ConnectionStatus};

/// Callback invoked once per inbound frame, in arrival order.
pub type FrameHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Identifies one opened link. Only the most recent handle can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHandle {
    generation: u64,
}

impl ConnectionHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct OutboundFrame {
    text: String,
    written: oneshot::Sender<Result<(), LedgerdeskError>>,
}

struct LiveLink {
    generation: u64,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    cancel: CancellationToken,
}

impl Drop for LiveLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns the duplex link and publishes its status.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    status: Arc<watch::Sender<ConnectionStatus>>,
    generation: AtomicU64,
    live: ArcSwapOption<LiveLink>,
}

/// Apply `state` for `generation` unless a newer generation has been
/// published or this generation already reached a terminal state.
///
/// Returns whether the published status changed.
fn publish(
    status: &watch::Sender<ConnectionStatus>,
    generation: u64,
    state: ConnectionState,
) -> bool {
    status.send_if_modified(|current| {
        if generation < current.generation {
            return false;
        }
        if generation == current.generation {
            let terminal = matches!(
                current.state,
                ConnectionState::Closed | ConnectionState::Error
            );
            if terminal || current.state == state {
                return false;
            }
        }
        *current = ConnectionStatus { generation, state };
        true
    })
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
            status: Arc::new(watch::Sender::new(ConnectionStatus::default())),
            generation: AtomicU64::new(0),
            live: ArcSwapOption::empty(),
        }
    }

    /// Open a new link to `endpoint`, tearing down the current one first.
    ///
    /// Returns immediately with the status set to `Connecting`; the connect
    /// runs on a spawned task. Must be called within a tokio runtime.
    pub fn open<F>(&self, endpoint: &str, on_frame: F) -> ConnectionHandle
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = self.live.swap(None) {
            debug!(generation = previous.generation, "tearing down previous link");
            previous.cancel.cancel();
        }

        publish(&self.status, generation, ConnectionState::Connecting);
        info!(generation, endpoint, "opening agent connection");

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        self.live.store(Some(Arc::new(LiveLink {
            generation,
            outbound,
            cancel: cancel.clone(),
        })));

        tokio::spawn(run_link(LinkTask {
            connector: Arc::clone(&self.connector),
            endpoint: endpoint.to_string(),
            generation,
            connect_timeout: self.connect_timeout,
            status: Arc::clone(&self.status),
            cancel,
            outbound_rx,
            on_frame: Arc::new(on_frame),
        }));

        ConnectionHandle { generation }
    }

    /// Write `text` as one frame on the link identified by `handle`.
    ///
    /// Fails with [`LedgerdeskError::NotConnected`] without transmitting
    /// anything unless `handle` is the live handle and the link is open.
    /// Resolves once the frame has been written.
    pub async fn send(
        &self,
        handle: ConnectionHandle,
        text: impl Into<String>,
    ) -> Result<(), LedgerdeskError> {
        let outbound = match self.live.load_full() {
            Some(link) if link.generation == handle.generation => link.outbound.clone(),
            _ => return Err(LedgerdeskError::NotConnected),
        };

        let current = *self.status.borrow();
        if current.generation != handle.generation || !current.state.is_open() {
            return Err(LedgerdeskError::NotConnected);
        }

        let (written, result) = oneshot::channel();
        outbound
            .send(OutboundFrame {
                text: text.into(),
                written,
            })
            .map_err(|_| LedgerdeskError::NotConnected)?;
        result.await.map_err(|_| LedgerdeskError::NotConnected)?
    }

    /// Close the live link. Idempotent.
    pub fn close(&self) {
        if let Some(link) = self.live.swap(None) {
            link.cancel.cancel();
            if publish(&self.status, link.generation, ConnectionState::Closed) {
                info!(generation = link.generation, "agent connection closed");
            }
        }
    }

    /// Handle of the live link, if any.
    pub fn current_handle(&self) -> Option<ConnectionHandle> {
        self.live.load_full().map(|link| ConnectionHandle {
            generation: link.generation,
        })
    }

    pub fn status(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Status together with the generation it belongs to.
    pub fn status_detail(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watch every status transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(link) = self.live.swap(None) {
            link.cancel.cancel();
        }
    }
}

struct LinkTask {
    connector: Arc<dyn Connector>,
    endpoint: String,
    generation: u64,
    connect_timeout: Duration,
    status: Arc<watch::Sender<ConnectionStatus>>,
    cancel: CancellationToken,
    outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
    on_frame: FrameHandler,
}

async fn run_link(task: LinkTask) {
    let LinkTask {
        connector,
        endpoint,
        generation,
        connect_timeout,
        status,
        cancel,
        mut outbound_rx,
        on_frame,
    } = task;

    let connect = tokio::time::timeout(connect_timeout, connector.connect(&endpoint));
    let link = tokio::select! {
        _ = cancel.cancelled() => {
            debug!(generation, "connect abandoned");
            return;
        }
        result = connect => match result {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => {
                warn!(generation, endpoint = %endpoint, error = %e, "agent connection failed");
                publish(&status, generation, ConnectionState::Error);
                return;
            }
            Err(_) => {
                warn!(
                    generation,
                    endpoint = %endpoint,
                    timeout_secs = connect_timeout.as_secs(),
                    "agent connection timed out"
                );
                publish(&status, generation, ConnectionState::Error);
                return;
            }
        }
    };

    // close() may have run while the connect was completing.
    if cancel.is_cancelled() {
        return;
    }
    if publish(&status, generation, ConnectionState::Open) {
        info!(generation, "agent connection open");
    }

    let mut sink = link.sink;
    let mut stream = link.stream;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                if let Err(e) = sink.close().await {
                    debug!(generation, error = %e, "close handshake failed");
                }
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(text)) => on_frame(text),
                Some(Err(e)) => {
                    warn!(generation, error = %e, "agent connection failed while open");
                    publish(&status, generation, ConnectionState::Error);
                    break;
                }
                None => {
                    info!(generation, "agent closed the connection");
                    publish(&status, generation, ConnectionState::Closed);
                    break;
                }
            },
            Some(frame) = outbound_rx.recv() => {
                match sink.send(frame.text).await {
                    Ok(()) => {
                        let _ = frame.written.send(Ok(()));
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "write to agent failed");
                        publish(&status, generation, ConnectionState::Error);
                        let _ = frame.written.send(Err(e));
                        break;
                    }
                }
            }
        }
    }
}
