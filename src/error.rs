//! Error taxonomy for the client.
//!
//! One enum covers both API surfaces. Realtime operations surface the
//! connection-lifecycle variants (`Connect`, `Auth`, `Send`, `Receive`,
//! `NoActiveSubscription`); REST operations surface `Http`/`Api`. Handshake
//! and transport failures never advance connection state, so a caller that
//! sees one of these may simply retry the operation.

/// Error returned by every fallible operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Opening the socket failed, or the handshake reply never arrived.
    #[error("realtime connect failed: {0}")]
    Connect(String),
    /// The login step was never acknowledged by the server.
    #[error("realtime authentication failed: {0}")]
    Auth(String),
    /// A frame write was attempted on a closed or cancelled transport.
    #[error("send failed: {0}")]
    Send(String),
    /// A frame read was aborted by socket closure or cancellation.
    #[error("receive failed: {0}")]
    Receive(String),
    /// `unsubscribe` was called while no subscription with that id is active.
    #[error("no active subscription with id `{0}`")]
    NoActiveSubscription(String),
    /// The configured host address cannot be turned into a URL.
    #[error("invalid host address: {0}")]
    InvalidHost(String),
    /// An HTTP request failed at the transport level.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered an HTTP request with a non-success status.
    #[error("server returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    /// A payload could not be serialized or parsed.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// A JSON response is missing a field the client relies on.
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
}

impl ClientError {
    /// True for errors produced by teardown rather than by the server.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Send(reason) | Self::Receive(reason) => reason == "cancelled",
            _ => false,
        }
    }

    pub(crate) fn cancelled_send() -> Self {
        Self::Send("cancelled".to_owned())
    }

    pub(crate) fn cancelled_receive() -> Self {
        Self::Receive("cancelled".to_owned())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
