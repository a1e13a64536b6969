// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket connector for the remote agent.
//!
//! Each text message is one frame. Binary, ping and pong messages are not
//! frames and are skipped; a close message ends the inbound stream.

use std::future;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use ledgerdesk_core::LedgerdeskError;
use ledgerdesk_core::traits::{Adapter, Connector, DuplexLink};

/// [`Connector`] backed by `tokio-tungstenite`. Supports `ws://` and `wss://`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

fn transport_error(context: &str, err: tungstenite::Error) -> LedgerdeskError {
    LedgerdeskError::Transport {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}

impl Adapter for WsConnector {
    fn name(&self) -> &str {
        "websocket"
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<DuplexLink, LedgerdeskError> {
        let (socket, response) = connect_async(endpoint)
            .await
            .map_err(|e| transport_error(&format!("connect to {endpoint}"), e))?;
        tracing::debug!(endpoint, status = %response.status(), "websocket handshake complete");

        let (write, read) = socket.split();

        let sink = write
            .sink_map_err(|e| transport_error("write", e))
            .with(|frame: String| future::ready(Ok::<_, LedgerdeskError>(Message::text(frame))));

        let stream = read
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => {
                        tracing::debug!(len = bytes.len(), "ignoring binary message");
                        None
                    }
                    Ok(_) => None,
                    Err(tungstenite::Error::ConnectionClosed) => None,
                    Err(e) => Some(Err(transport_error("read", e))),
                })
            });

        Ok(DuplexLink {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
