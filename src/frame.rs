//! Realtime wire frames.
//!
//! ARCHITECTURE
//! ============
//! Every exchange on the realtime socket is one self-describing JSON text
//! frame with a `msg` discriminator and, for most kinds, an `id` correlation
//! field chosen by the caller. Outbound frames are built here as
//! `serde_json::Value`; the transport serializes them to text. Inbound text is
//! classified here and dispatched by the reader loop — the loop never
//! inspects payloads beyond `msg` and `id`.
//!
//! DESIGN
//! ======
//! - Passwords never cross the wire in clear: the login frame carries a
//!   SHA-256 hex digest plus the algorithm name.
//! - Classification is tolerant: text that is not JSON, or JSON without a
//!   `msg` field, is still a valid push frame and is delivered verbatim.

use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

// =============================================================================
// DISCRIMINATORS
// =============================================================================

/// `msg` value of the one-time protocol handshake frame.
pub const MSG_CONNECT: &str = "connect";
/// `msg` value of method-call frames (login, ad-hoc calls).
pub const MSG_METHOD: &str = "method";
/// `msg` value of subscription requests.
pub const MSG_SUB: &str = "sub";
/// `msg` value of unsubscribe requests.
pub const MSG_UNSUB: &str = "unsub";
/// `msg` value of the server keepalive probe.
pub const MSG_PING: &str = "ping";
/// `msg` value of the keepalive acknowledgement.
pub const MSG_PONG: &str = "pong";

/// Stream name for room-message subscriptions.
pub const STREAM_ROOM_MESSAGES: &str = "stream-room-messages";

/// Protocol version announced in the connect frame.
const PROTOCOL_VERSION: &str = "1";

// =============================================================================
// OUTBOUND BUILDERS
// =============================================================================

/// The one-time handshake frame announcing the supported protocol version.
#[must_use]
pub fn connect() -> Value {
    json!({
        "msg": MSG_CONNECT,
        "version": PROTOCOL_VERSION,
        "support": [PROTOCOL_VERSION],
    })
}

/// Login by resuming an existing session with a bearer token.
#[must_use]
pub fn login_with_token(correlation_id: &str, token: &str) -> Value {
    json!({
        "msg": MSG_METHOD,
        "method": "login",
        "id": correlation_id,
        "params": [{ "resume": token }],
    })
}

/// Login with username and password. The plaintext is digested here; only
/// the digest is placed in the frame.
#[must_use]
pub fn login_with_password(correlation_id: &str, username: &str, password: &str) -> Value {
    json!({
        "msg": MSG_METHOD,
        "method": "login",
        "id": correlation_id,
        "params": [{
            "user": { "username": username },
            "password": { "digest": password_digest(password), "algorithm": "sha-256" },
        }],
    })
}

/// Subscribe to the message stream of one room.
#[must_use]
pub fn subscribe(correlation_id: &str, room_id: &str) -> Value {
    json!({
        "msg": MSG_SUB,
        "id": correlation_id,
        "name": STREAM_ROOM_MESSAGES,
        "params": [room_id, false],
    })
}

/// Cancel the subscription previously opened under `correlation_id`.
#[must_use]
pub fn unsubscribe(correlation_id: &str) -> Value {
    json!({ "msg": MSG_UNSUB, "id": correlation_id })
}

/// Keepalive acknowledgement. Carries no id.
#[must_use]
pub fn pong() -> Value {
    json!({ "msg": MSG_PONG })
}

/// Arbitrary realtime method call.
#[must_use]
pub fn method(correlation_id: &str, method: &str, params: Value) -> Value {
    json!({
        "msg": MSG_METHOD,
        "method": method,
        "id": correlation_id,
        "params": params,
    })
}

/// Lowercase SHA-256 hex digest of a plaintext password.
#[must_use]
pub fn password_digest(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    let bytes = hasher.finalize();
    bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
}

// =============================================================================
// INBOUND CLASSIFICATION
// =============================================================================

/// Routing fields of an inbound frame. Everything else is opaque payload.
#[derive(Debug, Clone, Default, Deserialize)]
struct InboundHeader {
    msg: Option<String>,
    id: Option<String>,
}

/// One frame received from the socket, with just enough structure extracted
/// to route it: the `msg` discriminator and the `id` correlation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Verbatim frame text as received.
    pub raw: String,
    /// `msg` discriminator, if the frame is JSON and carries one.
    pub msg: Option<String>,
    /// `id` correlation field, if present.
    pub id: Option<String>,
}

impl InboundFrame {
    /// Classify one frame of inbound text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let header = serde_json::from_str::<InboundHeader>(text).unwrap_or_default();
        Self { raw: text.to_owned(), msg: header.msg, id: header.id }
    }

    /// True for the server keepalive probe.
    #[must_use]
    pub fn is_ping(&self) -> bool {
        self.msg.as_deref() == Some(MSG_PING)
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
