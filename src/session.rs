//! Session and identity management for GitDrop.
//!
//! A session pairs a personal access token with the identity it resolved
//! to. The content store only ever asks the provider for a request
//! capability; it never stores the token itself.

use std::fmt;
use std::sync::RwLock;

use serde::Deserialize;
use tracing::{debug, info};

use crate::{GitDropError, Result};

/// Opaque credential used to authorize store requests.
///
/// `Debug` output never contains the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting empty input.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(GitDropError::Validation(
                "a personal access token is required".to_string(),
            ));
        }
        Ok(Self(token))
    }

    /// The raw token, for the Authorization header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

/// Account a credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// Login name.
    pub login: String,
    /// Display name; falls back to the login when the account has none.
    #[serde(rename = "name", default)]
    pub display_name: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: String,
}

impl Identity {
    /// Name to show for this account.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.login)
    }
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Credential for store requests.
    pub token: Credential,
    /// Account the credential resolved to.
    pub identity: Identity,
}

/// Supplies request capabilities to the content store.
pub trait SessionProvider: Send + Sync {
    /// Credential for the next request, or `None` when signed out.
    fn request_capability(&self) -> Option<Credential>;

    /// Identity of the signed-in account.
    fn current_user(&self) -> Option<Identity>;
}

/// Holds at most one active session.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create a signed-out store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an already validated session.
    pub fn with_session(session: Session) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    /// Replace the active session.
    pub fn login(&self, session: Session) {
        info!(login = %session.identity.login, "Signed in");
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(session);
    }

    /// End the active session.
    ///
    /// Returns `true` if a session was active.
    pub fn logout(&self) -> bool {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let ended = current.take();
        if let Some(ref session) = ended {
            info!(login = %session.identity.login, "Signed out");
        } else {
            debug!("Logout requested without an active session");
        }
        ended.is_some()
    }

    /// Whether a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .map(|s| s.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }
}

impl SessionProvider for SessionStore {
    fn request_capability(&self) -> Option<Credential> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        current.as_ref().map(|s| s.token.clone())
    }

    fn current_user(&self) -> Option<Identity> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        current.as_ref().map(|s| s.identity.clone())
    }
}
