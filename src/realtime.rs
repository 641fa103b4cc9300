//! Realtime session — handshake, subscriptions, reader loop, ad-hoc calls.
//!
//! ARCHITECTURE
//! ============
//! One `RealtimeSession` owns one socket connection for its whole lifetime.
//! The connection goes through a monotonic handshake,
//! `Disconnected → Connected → Authenticated`, each step executed at most
//! once; every public operation ensures both steps before its own work.
//!
//! After the handshake, a single long-lived reader task owns the receive half
//! of the transport and classifies every inbound frame:
//! - keepalive `ping` → answer `pong` immediately, before the next read;
//! - frame whose `id` matches a pending ad-hoc call → route to that waiter;
//! - anything else → append to the delivered-message log in receipt order.
//!
//! CONCURRENCY
//! ===========
//! One `tokio::sync::Mutex` guards the phase and the write half, so handshake
//! transitions serialize and frame writes never interleave. The pending map,
//! subscription map and message log sit behind std mutexes that are never
//! held across an await. One `CancellationToken` per connection aborts every
//! pending send/receive and stops the reader loop; there are no per-operation
//! timeouts, so a missing reply blocks until teardown fires the token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::ClientError;
use crate::frame::{self, InboundFrame};
use crate::session::{self, SharedSession};
use crate::transport::{Connect, FrameSink, FrameStream};

// =============================================================================
// STATE
// =============================================================================

/// Handshake phase. Monotonic: only teardown moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connected,
    Authenticated,
}

/// One room-message subscription, keyed externally by its correlation id.
#[derive(Debug, Clone)]
struct Subscription {
    room_id: String,
    active: bool,
}

/// Connection state guarded by the session mutex.
struct ConnState {
    phase: Phase,
    sink: Option<Box<dyn FrameSink>>,
    /// Receive half; present until the reader loop takes ownership of it.
    stream: Option<Box<dyn FrameStream>>,
    reader: Option<JoinHandle<()>>,
}

struct Inner {
    config: ClientConfig,
    auth: SharedSession,
    connector: Box<dyn Connect>,
    cancel: CancellationToken,
    conn: tokio::sync::Mutex<ConnState>,
    /// Ad-hoc callers waiting for a reply, keyed by correlation id.
    pending: Mutex<HashMap<String, oneshot::Sender<String>>>,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    /// Delivered-payload log. The reader loop is the sole writer.
    messages: Mutex<Vec<String>>,
}

/// Client for the realtime (websocket) API.
pub struct RealtimeSession {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl RealtimeSession {
    /// Build a session over the given transport factory. Nothing is opened
    /// until the first operation needs the socket.
    #[must_use]
    pub fn new(config: ClientConfig, auth: SharedSession, connector: Box<dyn Connect>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                auth,
                connector,
                cancel: CancellationToken::new(),
                conn: tokio::sync::Mutex::new(ConnState {
                    phase: Phase::Disconnected,
                    sink: None,
                    stream: None,
                    reader: None,
                }),
                pending: Mutex::new(HashMap::new()),
                subscriptions: Mutex::new(HashMap::new()),
                messages: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Subscribe to the message stream of `room_id` under a caller-chosen
    /// correlation id, performing the handshake first if needed. Starts the
    /// reader loop on first use.
    ///
    /// # Errors
    ///
    /// Surfaces handshake and transport errors; the subscription is recorded
    /// active only after the control frame was written.
    pub async fn subscribe_room_messages(
        &self,
        room_id: &str,
        correlation_id: &str,
    ) -> Result<(), ClientError> {
        let mut conn = self.inner.conn.lock().await;
        self.ensure_connected(&mut conn).await?;
        self.ensure_authenticated(&mut conn, correlation_id).await?;

        let frame = frame::subscribe(correlation_id, room_id).to_string();
        sink_of(&mut conn)?.send_frame(frame).await?;

        lock(&self.inner.subscriptions).insert(
            correlation_id.to_owned(),
            Subscription { room_id: room_id.to_owned(), active: true },
        );
        self.start_reader(&mut conn);
        info!(room_id, correlation_id, "subscription stream opened");
        Ok(())
    }

    /// Cancel the subscription previously opened under `correlation_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoActiveSubscription`] — and writes nothing —
    /// if no subscription with that id is active.
    pub async fn unsubscribe(&self, correlation_id: &str) -> Result<(), ClientError> {
        let mut conn = self.inner.conn.lock().await;
        let is_active = lock(&self.inner.subscriptions)
            .get(correlation_id)
            .is_some_and(|sub| sub.active);
        if !is_active {
            return Err(ClientError::NoActiveSubscription(correlation_id.to_owned()));
        }

        let frame = frame::unsubscribe(correlation_id).to_string();
        sink_of(&mut conn)?.send_frame(frame).await?;
        if let Some(sub) = lock(&self.inner.subscriptions).remove(correlation_id) {
            info!(correlation_id, room_id = %sub.room_id, "unsubscribed stream");
        }
        Ok(())
    }

    /// Send one frame and await exactly one reply carrying the same
    /// correlation id. The reply is routed by the reader loop, so this call
    /// never competes with it for the socket.
    ///
    /// # Errors
    ///
    /// Surfaces handshake and transport errors; fails with
    /// [`ClientError::Receive`] if the connection is torn down while waiting.
    pub async fn send_and_await(
        &self,
        correlation_id: &str,
        frame: Value,
    ) -> Result<String, ClientError> {
        let mut conn = self.inner.conn.lock().await;
        self.ensure_connected(&mut conn).await?;
        self.ensure_authenticated(&mut conn, correlation_id).await?;
        self.start_reader(&mut conn);

        let (tx, rx) = oneshot::channel();
        lock(&self.inner.pending).insert(correlation_id.to_owned(), tx);

        let send_result = sink_of(&mut conn)?.send_frame(frame.to_string()).await;
        if let Err(error) = send_result {
            lock(&self.inner.pending).remove(correlation_id);
            return Err(error);
        }
        drop(conn);

        tokio::select! {
            () = self.inner.cancel.cancelled() => {
                lock(&self.inner.pending).remove(correlation_id);
                Err(ClientError::cancelled_receive())
            }
            reply = rx => {
                reply.map_err(|_| ClientError::Receive("reader loop ended".to_owned()))
            }
        }
    }

    /// Call a realtime API method and return the raw reply frame.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::send_and_await`].
    pub async fn call_method(
        &self,
        correlation_id: &str,
        method: &str,
        params: Value,
    ) -> Result<String, ClientError> {
        self.send_and_await(correlation_id, frame::method(correlation_id, method, params))
            .await
    }

    /// Snapshot of the delivered-payload log, in receipt order.
    #[must_use]
    pub fn streamed_messages(&self) -> Vec<String> {
        lock(&self.inner.messages).clone()
    }

    /// Whether a subscription with this correlation id is currently recorded
    /// active. Does not reflect reader-loop liveness.
    #[must_use]
    pub fn is_subscribed(&self, correlation_id: &str) -> bool {
        lock(&self.inner.subscriptions)
            .get(correlation_id)
            .is_some_and(|sub| sub.active)
    }

    /// The room an active subscription streams from, if one is recorded
    /// under this correlation id.
    #[must_use]
    pub fn subscribed_room(&self, correlation_id: &str) -> Option<String> {
        lock(&self.inner.subscriptions)
            .get(correlation_id)
            .filter(|sub| sub.active)
            .map(|sub| sub.room_id.clone())
    }

    /// Whether the background reader task has run to completion. False when
    /// the reader was never started.
    pub async fn reader_is_finished(&self) -> bool {
        self.inner
            .conn
            .lock()
            .await
            .reader
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
    }

    /// Current handshake phase.
    pub async fn phase(&self) -> Phase {
        self.inner.conn.lock().await.phase
    }

    /// Tear the connection down: fire the cancellation signal, clear every
    /// subscription and reset the phase. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        lock(&self.inner.subscriptions).clear();
        lock(&self.inner.pending).clear();

        let mut conn = self.inner.conn.lock().await;
        conn.phase = Phase::Disconnected;
        conn.sink = None;
        conn.stream = None;
        if let Some(reader) = conn.reader.take() {
            drop(conn);
            if reader.await.is_err() {
                warn!("reader task aborted during shutdown");
            }
        }
        debug!("realtime session shut down");
    }

    // =========================================================================
    // HANDSHAKE
    // =========================================================================

    /// Open the socket and run the protocol handshake once. No-op past
    /// `Disconnected`. On failure the phase is unchanged and the half-open
    /// socket is discarded, so the caller may retry the same step.
    async fn ensure_connected(&self, conn: &mut ConnState) -> Result<(), ClientError> {
        if conn.phase != Phase::Disconnected {
            return Ok(());
        }

        let url = self.inner.config.websocket_url()?;
        let (mut sink, mut stream) = self
            .inner
            .connector
            .connect(&url, self.inner.cancel.clone())
            .await?;

        sink.send_frame(frame::connect().to_string())
            .await
            .map_err(|error| ClientError::Connect(error.to_string()))?;
        let reply = stream
            .next_frame()
            .await
            .map_err(|error| ClientError::Connect(error.to_string()))?;
        debug!(reply, "connect handshake reply");

        conn.sink = Some(sink);
        conn.stream = Some(stream);
        conn.phase = Phase::Connected;
        info!(host = %self.inner.config.host, "realtime connected");
        Ok(())
    }

    /// Send the login frame once and read its single acknowledgement. No-op
    /// when already `Authenticated`; phase is unchanged on failure.
    async fn ensure_authenticated(
        &self,
        conn: &mut ConnState,
        correlation_id: &str,
    ) -> Result<(), ClientError> {
        if conn.phase != Phase::Connected {
            return Ok(());
        }

        let login = self.login_frame(correlation_id).to_string();
        sink_of(conn)?.send_frame(login).await?;

        let stream = conn
            .stream
            .as_mut()
            .ok_or_else(|| ClientError::Auth("receive half unavailable".to_owned()))?;
        let reply = stream
            .next_frame()
            .await
            .map_err(|error| ClientError::Auth(error.to_string()))?;
        debug!(reply, "login reply");

        conn.phase = Phase::Authenticated;
        info!("realtime authenticated");
        Ok(())
    }

    /// Resume-token form when a token is known, hashed-password form
    /// otherwise.
    fn login_frame(&self, correlation_id: &str) -> Value {
        if let Some(token) = session::read(&self.inner.auth).auth_token {
            return frame::login_with_token(correlation_id, &token);
        }
        match &self.inner.config.credentials {
            Credentials::Password { username, password } => {
                frame::login_with_password(correlation_id, username, password)
            }
            // Token credentials seed the shared session, so this arm is only
            // reachable if the session was cleared externally.
            Credentials::Token(token) => frame::login_with_token(correlation_id, token),
        }
    }

    /// Hand the receive half to the reader loop. Runs at most once per
    /// connection; later calls are no-ops.
    fn start_reader(&self, conn: &mut ConnState) {
        if conn.reader.is_some() {
            return;
        }
        let Some(stream) = conn.stream.take() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        conn.reader = Some(tokio::spawn(reader_loop(inner, stream)));
    }
}

fn sink_of(conn: &mut ConnState) -> Result<&mut Box<dyn FrameSink>, ClientError> {
    conn.sink
        .as_mut()
        .ok_or_else(|| ClientError::Send("transport not open".to_owned()))
}

// =============================================================================
// READER LOOP
// =============================================================================

/// The single task owning the receive side. Ends on cancellation or receive
/// failure; it is never restarted — resumption requires a fresh subscribe on
/// a fresh session.
async fn reader_loop(inner: Arc<Inner>, mut stream: Box<dyn FrameStream>) {
    loop {
        let received = tokio::select! {
            () = inner.cancel.cancelled() => break,
            received = stream.next_frame() => received,
        };
        let text = match received {
            Ok(text) => text,
            Err(error) => {
                if error.is_cancellation() {
                    debug!("reader loop cancelled");
                } else {
                    warn!(error = %error, "reader loop ended");
                }
                break;
            }
        };
        if inner.cancel.is_cancelled() {
            break;
        }

        let frame = InboundFrame::parse(&text);
        if frame.is_ping() {
            // Answer before the next read; the server disconnects silent peers.
            if let Err(error) = send_pong(&inner).await {
                warn!(error = %error, "keepalive acknowledgement failed");
                break;
            }
            continue;
        }

        if let Some(id) = &frame.id {
            let waiter = lock(&inner.pending).remove(id);
            if let Some(waiter) = waiter {
                let _ = waiter.send(text);
                continue;
            }
        }

        debug!(frame = %text, "streamed message");
        lock(&inner.messages).push(text);
    }
    debug!("subscription stream closed");
}

async fn send_pong(inner: &Arc<Inner>) -> Result<(), ClientError> {
    let mut conn = inner.conn.lock().await;
    sink_of(&mut conn)?.send_frame(frame::pong().to_string()).await
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
