//! # Sessions
//!
//! On startup the app resolves a stable identity for the current context:
//! an existing session is reused if the backend still accepts it, otherwise
//! a new anonymous identity is established. Identity transitions (login,
//! logout, expiry) are broadcast so the directory subscription can be
//! re-opened under the new identity.
//!
//! Session loss is self-healing: [`SessionManager::handle_session_end`]
//! re-attempts anonymous establishment without user action. If the backend
//! refuses (anonymous issuance disabled server-side), the identity remains
//! absent and all identity-gated operations are refused upstream.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::document::UserId;

pub mod memory;
pub mod rest;

pub use memory::MemoryAuthProvider;
pub use rest::RestAuthProvider;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A resolved identity plus the bearer token the backends accept for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub access_token: String,
}

/// Where session establishment currently stands.
///
/// `Resolving` is distinct from `Unavailable`: the former means "not known
/// yet", the latter "resolved to no identity".
#[derive(Debug, Clone)]
pub enum SessionState {
    Resolving,
    Ready(Session),
    Unavailable { reason: String },
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Resolving)
    }

    pub fn identity(&self) -> Option<&UserId> {
        match self {
            SessionState::Ready(session) => Some(&session.user_id),
            _ => None,
        }
    }
}

/// Identity transition notifications.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(UserId),
    SignedOut,
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("anonymous sign-ins are disabled for this project")]
    AnonymousDisabled,
    #[error("authentication rejected: {0}")]
    Rejected(String),
    #[error("session expired or invalid")]
    SessionExpired,
    #[error("malformed auth response: {0}")]
    Malformed(String),
}

/// The auth backend surface: anonymous issuance, custom-token sign-in,
/// and validation of a previously issued token.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    async fn sign_in_anonymously(&self) -> Result<Session, AuthError>;

    async fn sign_in_with_token(&self, token: &str) -> Result<Session, AuthError>;

    /// Validate a stored access token, returning the identity it belongs to.
    async fn current_user(&self, access_token: &str) -> Result<UserId, AuthError>;
}

/// Resolves and tracks the identity for this app instance.
#[derive(Debug, Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
    restored_token: Option<String>,
    state: Arc<parking_lot::RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            auth,
            restored_token: None,
            state: Arc::new(parking_lot::RwLock::new(SessionState::Resolving)),
            events,
        }
    }

    /// Attach a token from a previous run; `resolve` will try to reuse it
    /// before falling back to anonymous issuance.
    pub fn with_restored_token(mut self, token: Option<String>) -> Self {
        self.restored_token = token;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn identity(&self) -> Option<UserId> {
        self.state.read().identity().cloned()
    }

    pub fn is_resolved(&self) -> bool {
        self.state.read().is_resolved()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Resolve an identity: reuse the restored session if the backend still
    /// accepts it, otherwise establish a new anonymous one.
    pub async fn resolve(&self) -> Result<Session, AuthError> {
        if let Some(token) = &self.restored_token {
            match self.auth.current_user(token).await {
                Ok(user_id) => {
                    let session = Session {
                        user_id,
                        access_token: token.clone(),
                    };
                    self.set_ready(session.clone());
                    return Ok(session);
                }
                Err(e) => {
                    tracing::debug!("stored session rejected, trying anonymous: {}", e);
                }
            }
        }
        self.sign_in_anonymously().await
    }

    pub async fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        match self.auth.sign_in_anonymously().await {
            Ok(session) => {
                self.set_ready(session.clone());
                Ok(session)
            }
            Err(e) => {
                self.set_unavailable(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn sign_in_with_token(&self, token: &str) -> Result<Session, AuthError> {
        match self.auth.sign_in_with_token(token).await {
            Ok(session) => {
                self.set_ready(session.clone());
                Ok(session)
            }
            Err(e) => {
                self.set_unavailable(e.to_string());
                Err(e)
            }
        }
    }

    /// The backend ended our session. Notify listeners, then re-establish
    /// an anonymous identity without user action.
    pub async fn handle_session_end(&self) -> Result<Session, AuthError> {
        *self.state.write() = SessionState::Resolving;
        let _ = self.events.send(SessionEvent::SignedOut);
        self.sign_in_anonymously().await
    }

    fn set_ready(&self, session: Session) {
        let user_id = session.user_id.clone();
        *self.state.write() = SessionState::Ready(session);
        let _ = self.events.send(SessionEvent::SignedIn(user_id));
    }

    fn set_unavailable(&self, reason: String) {
        *self.state.write() = SessionState::Unavailable {
            reason: reason.clone(),
        };
        let _ = self.events.send(SessionEvent::Unavailable(reason));
    }
}
