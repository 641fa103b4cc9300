//! Transport seam: one duplex, message-framed socket per connection.
//!
//! DESIGN
//! ======
//! The realtime session talks to the wire through two object-safe traits,
//! [`FrameSink`] for writes and [`FrameStream`] for reads, produced together
//! by a [`Connect`] implementation. Splitting the duplex socket into halves
//! lets the reader loop own the receive side outright while writers share the
//! sink behind the connection lock.
//!
//! Every operation is raced against the connection's [`CancellationToken`]:
//! once teardown fires the token, in-flight and future sends/receives fail
//! fast with a cancellation error. The token is idempotent and shared by all
//! halves of one connection; the socket is never silently replaced.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ClientError;

/// Write half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Send`] if the socket is closed or the
    /// cancellation token has fired.
    async fn send_frame(&mut self, text: String) -> Result<(), ClientError>;
}

/// Read half of a connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Receive the next text frame, suspending until one arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Receive`] on socket closure or cancellation.
    async fn next_frame(&mut self) -> Result<String, ClientError>;
}

/// Factory producing the two halves of a fresh connection.
#[async_trait]
pub trait Connect: Send + Sync {
    /// Open one socket to `url` and split it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] on network or TLS failure, or when
    /// the token is already cancelled.
    async fn connect(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), ClientError>;
}

// =============================================================================
// WEBSOCKET IMPLEMENTATION
// =============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production [`Connect`] implementation over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connect for WsConnector {
    async fn connect(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), ClientError> {
        let connected = tokio::select! {
            () = cancel.cancelled() => {
                return Err(ClientError::Connect("cancelled".to_owned()));
            }
            result = connect_async(url) => result,
        };

        let (socket, _response) =
            connected.map_err(|error| ClientError::Connect(error.to_string()))?;
        debug!(%url, "websocket connected");

        let (sink, stream) = socket.split();
        Ok((
            Box::new(WsSink { inner: sink, cancel: cancel.clone() }),
            Box::new(WsReader { inner: stream, cancel }),
        ))
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
    cancel: CancellationToken,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, text: String) -> Result<(), ClientError> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::cancelled_send());
        }
        tokio::select! {
            () = self.cancel.cancelled() => Err(ClientError::cancelled_send()),
            result = self.inner.send(Message::Text(text.into())) => {
                result.map_err(|error| ClientError::Send(error.to_string()))
            }
        }
    }
}

struct WsReader {
    inner: SplitStream<WsStream>,
    cancel: CancellationToken,
}

#[async_trait]
impl FrameStream for WsReader {
    async fn next_frame(&mut self) -> Result<String, ClientError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(ClientError::cancelled_receive());
            }
            let message = tokio::select! {
                () = self.cancel.cancelled() => return Err(ClientError::cancelled_receive()),
                message = self.inner.next() => message,
            };
            let Some(message) = message else {
                return Err(ClientError::Receive("socket closed".to_owned()));
            };
            match message.map_err(|error| ClientError::Receive(error.to_string()))? {
                Message::Text(text) => return Ok(text.to_string()),
                Message::Binary(bytes) => {
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                Message::Close(_) => {
                    return Err(ClientError::Receive("socket closed".to_owned()));
                }
                // Websocket-level control frames are not protocol frames.
                _ => {}
            }
        }
    }
}
