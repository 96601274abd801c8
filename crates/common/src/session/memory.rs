use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{AuthError, AuthProvider, Session};
use crate::document::UserId;

/// In-memory auth provider for tests and the `memory` backend.
///
/// Issues UUID identities and bearer tokens. Custom tokens are taken at
/// face value: the token text becomes the user id, which lets tests sign in
/// as a chosen identity. `with_anonymous_disabled` mirrors the hosted
/// service's switched-off anonymous issuance.
#[derive(Debug, Clone)]
pub struct MemoryAuthProvider {
    inner: Arc<parking_lot::Mutex<MemoryAuthProviderInner>>,
    anonymous_disabled: bool,
}

#[derive(Debug, Default)]
struct MemoryAuthProviderInner {
    /// access token -> identity
    sessions: HashMap<String, UserId>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(parking_lot::Mutex::new(MemoryAuthProviderInner::default())),
            anonymous_disabled: false,
        }
    }

    pub fn with_anonymous_disabled(mut self) -> Self {
        self.anonymous_disabled = true;
        self
    }

    /// Invalidate every issued token, as a backend-side session expiry would.
    pub fn end_sessions(&self) {
        self.inner.lock().sessions.clear();
    }

    fn issue(&self, user_id: UserId) -> Session {
        let access_token = Uuid::new_v4().to_string();
        self.inner
            .lock()
            .sessions
            .insert(access_token.clone(), user_id.clone());
        Session {
            user_id,
            access_token,
        }
    }
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        if self.anonymous_disabled {
            return Err(AuthError::AnonymousDisabled);
        }
        Ok(self.issue(UserId::new(Uuid::new_v4().to_string())))
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<Session, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Rejected("empty custom token".to_string()));
        }
        Ok(self.issue(UserId::new(token)))
    }

    async fn current_user(&self, access_token: &str) -> Result<UserId, AuthError> {
        self.inner
            .lock()
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(AuthError::SessionExpired)
    }
}
