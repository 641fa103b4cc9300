//! `RocketChatClient` — one façade over both API surfaces.
//!
//! Owns the shared session state and hands it to the REST client and the
//! realtime session, so a REST login feeds the realtime resume login and a
//! configured token serves both. The hosting application drives the
//! lifecycle: [`RocketChatClient::initialize`] once after construction and
//! [`RocketChatClient::cleanup`] on teardown, which fires the connection's
//! cancellation signal and clears all connected/active state.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::{ClientConfig, Credentials};
use crate::error::ClientError;
use crate::realtime::RealtimeSession;
use crate::rest::{RequestType, RestClient};
use crate::session::{self, SharedSession};
use crate::transport::WsConnector;

/// Client for one Rocket.Chat host.
pub struct RocketChatClient {
    config: ClientConfig,
    auth: SharedSession,
    rest: RestClient,
    realtime: RealtimeSession,
}

impl RocketChatClient {
    /// Build a client from a prepared configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let auth = session::shared_from_credentials(&config.credentials);
        let rest = RestClient::new(config.clone(), Arc::clone(&auth));
        let realtime =
            RealtimeSession::new(config.clone(), Arc::clone(&auth), Box::new(WsConnector));
        Self { config, auth, rest, realtime }
    }

    /// Client that logs in with username and password.
    #[must_use]
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(ClientConfig::with_password(host, username, password))
    }

    /// Client that resumes an existing session with a token.
    #[must_use]
    pub fn with_token(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(ClientConfig::with_token(host, token))
    }

    /// Lifecycle hook: validate the configuration and log the identity this
    /// client will use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHost`] for an empty or scheme-carrying
    /// host address.
    pub fn initialize(&self) -> Result<(), ClientError> {
        self.config.websocket_url()?;
        match &self.config.credentials {
            Credentials::Password { username, .. } => {
                info!(host = %self.config.host, username, "client initialized");
            }
            Credentials::Token(_) => {
                info!(host = %self.config.host, "client initialized with resume token");
            }
        }
        Ok(())
    }

    /// Lifecycle hook: tear down the realtime connection. Idempotent.
    pub async fn cleanup(&self) {
        self.realtime.shutdown().await;
        info!("client cleaned up");
    }

    /// The REST half of the client.
    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// The realtime half of the client.
    #[must_use]
    pub fn realtime(&self) -> &RealtimeSession {
        &self.realtime
    }

    /// Auth token currently in effect, if any.
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        session::read(&self.auth).auth_token
    }

    /// User id of the logged-in user, if known.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        session::read(&self.auth).user_id
    }

    // Delegates for the common calls, so simple callers never touch the
    // halves directly.

    /// See [`RestClient::login`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn login(&self) -> Result<Value, ClientError> {
        self.rest.login().await
    }

    /// See [`RestClient::post_message`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<Value, ClientError> {
        self.rest.post_message(channel, text).await
    }

    /// See [`RestClient::send_http_request`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn send_http_request(
        &self,
        request_type: RequestType,
        api_suffix: &str,
        payload: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.rest.send_http_request(request_type, api_suffix, payload).await
    }

    /// See [`RealtimeSession::subscribe_room_messages`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn subscribe_room_messages(
        &self,
        room_id: &str,
        correlation_id: &str,
    ) -> Result<(), ClientError> {
        self.realtime.subscribe_room_messages(room_id, correlation_id).await
    }

    /// See [`RealtimeSession::unsubscribe`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn unsubscribe_room_messages(&self, correlation_id: &str) -> Result<(), ClientError> {
        self.realtime.unsubscribe(correlation_id).await
    }

    /// See [`RealtimeSession::send_and_await`].
    ///
    /// # Errors
    ///
    /// Propagates the underlying call's error.
    pub async fn send_websocket_request(
        &self,
        correlation_id: &str,
        frame: Value,
    ) -> Result<String, ClientError> {
        self.realtime.send_and_await(correlation_id, frame).await
    }

    /// Snapshot of the messages streamed so far.
    #[must_use]
    pub fn streamed_messages(&self) -> Vec<String> {
        self.realtime.streamed_messages()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
