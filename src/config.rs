//! Client configuration: target host and credentials.
//!
//! The host is a bare address (`chat.example.org` or `chat.example.org:3000`),
//! no scheme; the builders in this module derive the REST and websocket URLs
//! from it. Credentials come in exactly two forms, mirroring the two ways of
//! logging in to the server: a username/password pair or a resume token. When
//! a token is known it always wins over the password pair.

use crate::error::ClientError;

/// How the client proves its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username and plaintext password. The password is never transmitted in
    /// clear; it is digested before inclusion in any frame or request body.
    Password { username: String, password: String },
    /// Bearer resume token from an earlier login.
    Token(String),
}

/// Configuration for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host address without scheme, e.g. `open.rocket.chat`.
    pub host: String,
    pub credentials: Credentials,
}

impl ClientConfig {
    /// Configure a client that logs in with username and password.
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            credentials: Credentials::Password {
                username: username.into(),
                password: password.into(),
            },
        }
    }

    /// Configure a client that resumes an existing session with a token.
    pub fn with_token(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self { host: host.into(), credentials: Credentials::Token(token.into()) }
    }

    /// Websocket endpoint for the realtime API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHost`] if the host is empty or already
    /// carries a scheme.
    pub fn websocket_url(&self) -> Result<String, ClientError> {
        let host = self.validated_host()?;
        Ok(format!("wss://{host}/websocket"))
    }

    /// REST endpoint for the given API path, e.g. `/api/v1/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidHost`] if the host is empty or already
    /// carries a scheme.
    pub fn rest_url(&self, api_suffix: &str) -> Result<String, ClientError> {
        let host = self.validated_host()?;
        let suffix = api_suffix.trim_start_matches('/');
        Ok(format!("https://{host}/{suffix}"))
    }

    fn validated_host(&self) -> Result<&str, ClientError> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() || host.contains("://") {
            return Err(ClientError::InvalidHost(self.host.clone()));
        }
        Ok(host)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
