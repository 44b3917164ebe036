//! WebSocket relay listener.
//!
//! Infrastructure layer: owns the socket, spawns one task per client and hands
//! validated images to the overlay. A client can only ever reach the overlay
//! through `OverlayHandle::present`.

use super::protocol::{self, OutboundMessage, ProtocolError, RelayMessage};
use crate::config::RELAY_MAX_MESSAGE_BYTES;
use crate::overlay::OverlayHandle;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;

pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RelayServer {
    /// Binds the listening socket. No fallback port is tried.
    pub async fn bind(addr: SocketAddr) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RelayError::Bind { addr, source })?;

        log::info!("[RELAY] Listening on ws://{}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts clients forever. Each connection runs in its own task.
    pub async fn serve(self, overlay: OverlayHandle) {
        let port = self.local_addr.port();
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::error!("[RELAY] Accept failed: {}", e);
                    continue;
                }
            };

            let overlay = overlay.clone();
            tokio::spawn(async move {
                match handle_connection(stream, peer, port, &overlay).await {
                    Ok(()) => log::info!("[RELAY] Producer disconnected: {}", peer),
                    Err(e) => log::warn!("[RELAY] Connection {} closed with error: {}", peer, e),
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    port: u16,
    overlay: &OverlayHandle,
) -> Result<(), RelayError> {
    let mut ws = tokio_tungstenite::accept_async_with_config(stream, Some(socket_config()))
        .await
        .map_err(RelayError::Handshake)?;
    log::info!("[RELAY] Producer connected: {}", peer);

    let ack = OutboundMessage::Connected { port }.to_json()?;
    ws.send(Message::Text(ack)).await.map_err(RelayError::Transport)?;

    while let Some(frame) = ws.next().await {
        let parsed = match frame.map_err(RelayError::Transport)? {
            Message::Text(text) => protocol::parse_frame(&text),
            Message::Binary(bytes) => protocol::parse_binary_frame(&bytes),
            Message::Close(_) => break,
            // Ping/pong are answered by tungstenite itself.
            _ => continue,
        };
        dispatch(parsed, peer, overlay);
    }

    Ok(())
}

/// Image payloads are large; lift both limits to the relay ceiling.
fn socket_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(RELAY_MAX_MESSAGE_BYTES);
    config.max_frame_size = Some(RELAY_MAX_MESSAGE_BYTES);
    config
}

/// Routes one parsed frame. Rejected frames never reach the overlay.
fn dispatch(
    parsed: Result<Option<RelayMessage>, ProtocolError>,
    peer: SocketAddr,
    overlay: &OverlayHandle,
) {
    match parsed {
        Ok(Some(RelayMessage::Image(frame))) => {
            log::info!(
                "[RELAY] Image from {}: {}x{} ({} bytes base64)",
                peer,
                frame.size.width,
                frame.size.height,
                frame.payload.len()
            );
            overlay.present(frame.payload, frame.size);
        }
        Ok(None) => log::debug!("[RELAY] Ignoring unknown message type from {}", peer),
        Err(e) => log::warn!("[RELAY] Dropped message from {}: {}", peer, e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("WebSocket handshake failed: {0}")]
    Handshake(tokio_tungstenite::tungstenite::Error),

    #[error("WebSocket transport error: {0}")]
    Transport(tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}
