//! Shared authentication state.
//!
//! One `SessionState` is shared between the REST client (which writes the
//! token and user id after a credential login) and the realtime session
//! (which prefers the token for its login frame). A token configured up
//! front seeds the state at construction, so it always takes precedence
//! over username/password.

use std::sync::{Arc, RwLock};

use crate::config::Credentials;

/// Auth material for the current login session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Bearer token (`X-Auth-Token` / realtime `resume`), once known.
    pub auth_token: Option<String>,
    /// User id (`X-User-Id`), once known.
    pub user_id: Option<String>,
}

/// Handle shared by the REST and realtime halves of one client.
pub type SharedSession = Arc<RwLock<SessionState>>;

/// Build the shared state, seeding the token if the credentials carry one.
#[must_use]
pub fn shared_from_credentials(credentials: &Credentials) -> SharedSession {
    let auth_token = match credentials {
        Credentials::Token(token) => Some(token.clone()),
        Credentials::Password { .. } => None,
    };
    Arc::new(RwLock::new(SessionState { auth_token, user_id: None }))
}

/// Lock a poisoned-or-not mutex-like `RwLock` for reading.
pub(crate) fn read(session: &SharedSession) -> SessionState {
    session
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

/// Store token and user id from a successful login.
pub(crate) fn store(session: &SharedSession, token: Option<String>, user_id: Option<String>) {
    let mut guard = session
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(token) = token {
        guard.auth_token = Some(token);
    }
    if let Some(user_id) = user_id {
        guard.user_id = Some(user_id);
    }
}
