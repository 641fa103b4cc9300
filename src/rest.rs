//! REST API client.
//!
//! Simple request/response calls against `https://{host}/api/v1`. No state
//! machine here: each method builds one request, sends it, and returns the
//! parsed JSON body. Authentication is the `X-Auth-Token` / `X-User-Id`
//! header pair, filled from the shared session once [`RestClient::login`]
//! has run (or a resume token was configured up front).

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::{ClientConfig, Credentials};
use crate::error::ClientError;
use crate::session::{self, SharedSession};

/// Request kinds accepted by [`RestClient::send_http_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Get,
    Post,
}

/// Client for the REST API.
pub struct RestClient {
    config: ClientConfig,
    auth: SharedSession,
    http: reqwest::Client,
}

impl RestClient {
    #[must_use]
    pub fn new(config: ClientConfig, auth: SharedSession) -> Self {
        Self { config, auth, http: reqwest::Client::new() }
    }

    /// Log in, preferring a known resume token over username/password.
    /// On success the token and user id from the response are stored in the
    /// shared session for every later REST and realtime call.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn login(&self) -> Result<Value, ClientError> {
        let token = session::read(&self.auth).auth_token;
        let body = login_body(token.as_deref(), &self.config.credentials);
        let value = self
            .request(Method::POST, "/api/v1/login", Some(body), false)
            .await?;

        let (token, user_id) = extract_login_tokens(&value);
        if let Some(user_id) = &user_id {
            info!(user_id, "login succeeded");
        }
        session::store(&self.auth, token, user_id);
        Ok(value)
    }

    /// Post a message to a room id, `#channel` or `@username`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<Value, ClientError> {
        let body = json!({ "channel": channel, "text": text });
        self.request(Method::POST, "/api/v1/chat.postMessage", Some(body), true)
            .await
    }

    /// Fetch the profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn me(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/api/v1/me", None, true).await
    }

    /// List the channels visible to the logged-in user.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn channel_list(&self) -> Result<Value, ClientError> {
        self.request(Method::GET, "/api/v1/channels.list", None, true)
            .await
    }

    /// List the threads of one channel.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn channel_threads(&self, room_id: &str) -> Result<Value, ClientError> {
        let path = format!("/api/v1/chat.getThreadsList?rid={room_id}");
        self.request(Method::GET, &path, None, true).await
    }

    /// Escape hatch: send an arbitrary GET or POST under the API host with
    /// the session's auth headers.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`]/[`ClientError::Api`] on request failure.
    pub async fn send_http_request(
        &self,
        request_type: RequestType,
        api_suffix: &str,
        payload: Option<Value>,
    ) -> Result<Value, ClientError> {
        let (method, body) = match request_type {
            RequestType::Get => (Method::GET, None),
            RequestType::Post => (Method::POST, payload),
        };
        self.request(method, api_suffix, body, true).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        with_auth: bool,
    ) -> Result<Value, ClientError> {
        let url = self.config.rest_url(path)?;
        debug!(%method, %url, "rest request");

        let mut headers = HeaderMap::new();
        if with_auth {
            let state = session::read(&self.auth);
            if let Some(token) = &state.auth_token {
                headers.insert(
                    "X-Auth-Token",
                    HeaderValue::from_str(token)
                        .map_err(|_| ClientError::MissingField("auth_token"))?,
                );
            }
            if let Some(user_id) = &state.user_id {
                headers.insert(
                    "X-User-Id",
                    HeaderValue::from_str(user_id)
                        .map_err(|_| ClientError::MissingField("user_id"))?,
                );
            }
        }

        let request = self.http.request(method, url).headers(headers);
        let request = if let Some(json) = body {
            request.json(&json)
        } else {
            request
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, body)
    }
}

/// Turns a raw HTTP response into the caller's JSON value. Error statuses
/// carry the body verbatim; a success body that is not JSON is an error,
/// not a silent null.
fn decode_body(status: reqwest::StatusCode, body: String) -> Result<Value, ClientError> {
    if !status.is_success() {
        return Err(ClientError::Api { status: status.as_u16(), body });
    }
    serde_json::from_str(&body).map_err(ClientError::from)
}

/// Body of the login request: a known token always wins.
fn login_body(session_token: Option<&str>, credentials: &Credentials) -> Value {
    if let Some(token) = session_token {
        return json!({ "resume": token });
    }
    match credentials {
        Credentials::Password { username, password } => {
            json!({ "username": username, "password": password })
        }
        Credentials::Token(token) => json!({ "resume": token }),
    }
}

/// Pull `data.authToken` / `data.userId` out of a login response.
fn extract_login_tokens(value: &Value) -> (Option<String>, Option<String>) {
    let field = |name: &str| {
        value
            .get("data")
            .and_then(|data| data.get(name))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    };
    (field("authToken"), field("userId"))
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
