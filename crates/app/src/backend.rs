use std::sync::Arc;

use common::directory::{
    Directory, DirectoryError, DocumentDirectoryProvider, DocumentWatch, MemoryDirectoryProvider,
    RelationalDirectoryProvider,
};
use common::document::{DocId, DocumentRecord, UserId};
use common::session::{MemoryAuthProvider, RestAuthProvider, SessionManager};

use crate::state::{AuthConfig, BackendConfig};

/// A provider failure with the dialect-specific type erased, so the app can
/// carry one directory error type regardless of the configured backend.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

fn erase<E: std::fmt::Display>(e: DirectoryError<E>) -> DirectoryError<BackendError> {
    match e {
        DirectoryError::Provider(p) => DirectoryError::Provider(BackendError(p.to_string())),
        DirectoryError::NotFound(id) => DirectoryError::NotFound(id),
        DirectoryError::NotOwner => DirectoryError::NotOwner,
        DirectoryError::InvalidGrantee => DirectoryError::InvalidGrantee,
    }
}

/// The configured directory backend, dispatching to one of the dialects.
#[derive(Debug, Clone)]
pub enum DirectoryHandle {
    Memory(Directory<MemoryDirectoryProvider>),
    Relational(Directory<RelationalDirectoryProvider>),
    Document(Directory<DocumentDirectoryProvider>),
}

impl DirectoryHandle {
    pub fn from_config(
        config: &BackendConfig,
        access_token: Option<&str>,
    ) -> Result<Self, BackendError> {
        match config {
            BackendConfig::Memory => Ok(DirectoryHandle::Memory(Directory::new(
                MemoryDirectoryProvider::new(),
            ))),
            BackendConfig::Relational { base_url, api_key } => {
                let provider = RelationalDirectoryProvider::new(base_url, api_key, access_token)
                    .map_err(|e| BackendError(e.to_string()))?;
                Ok(DirectoryHandle::Relational(Directory::new(provider)))
            }
            BackendConfig::Document {
                base_url,
                project_id,
                app_id,
                api_key,
            } => {
                let provider =
                    DocumentDirectoryProvider::new(base_url, project_id, app_id, api_key)
                        .map_err(|e| BackendError(e.to_string()))?;
                Ok(DirectoryHandle::Document(Directory::new(provider)))
            }
        }
    }

    /// Rebuild the handle with a fresh session token where the dialect
    /// authenticates with one. Returns `None` when the current handle can
    /// keep serving (the memory backend must not be rebuilt or its records
    /// would be lost; the document dialect authenticates per-request).
    pub fn refreshed(
        &self,
        config: &BackendConfig,
        access_token: Option<&str>,
    ) -> Result<Option<Self>, BackendError> {
        match config {
            BackendConfig::Relational { .. } => Ok(Some(Self::from_config(config, access_token)?)),
            _ => Ok(None),
        }
    }

    pub async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.insert(owner, url, file_name).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.insert(owner, url, file_name).await.map_err(erase),
            DirectoryHandle::Document(d) => d.insert(owner, url, file_name).await.map_err(erase),
        }
    }

    pub async fn delete(
        &self,
        id: &DocId,
        caller: &UserId,
    ) -> Result<(), DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.delete(id, caller).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.delete(id, caller).await.map_err(erase),
            DirectoryHandle::Document(d) => d.delete(id, caller).await.map_err(erase),
        }
    }

    pub async fn grant(
        &self,
        id: &DocId,
        caller: &UserId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.grant(id, caller, grantee).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.grant(id, caller, grantee).await.map_err(erase),
            DirectoryHandle::Document(d) => d.grant(id, caller, grantee).await.map_err(erase),
        }
    }

    pub async fn revoke(
        &self,
        id: &DocId,
        caller: &UserId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.revoke(id, caller, grantee).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.revoke(id, caller, grantee).await.map_err(erase),
            DirectoryHandle::Document(d) => d.revoke(id, caller, grantee).await.map_err(erase),
        }
    }

    pub async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.get(id).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.get(id).await.map_err(erase),
            DirectoryHandle::Document(d) => d.get(id).await.map_err(erase),
        }
    }

    pub async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.fetch_all().await.map_err(erase),
            DirectoryHandle::Relational(d) => d.fetch_all().await.map_err(erase),
            DirectoryHandle::Document(d) => d.fetch_all().await.map_err(erase),
        }
    }

    pub async fn subscribe(
        &self,
        identity: &UserId,
    ) -> Result<DocumentWatch, DirectoryError<BackendError>> {
        match self {
            DirectoryHandle::Memory(d) => d.subscribe(identity).await.map_err(erase),
            DirectoryHandle::Relational(d) => d.subscribe(identity).await.map_err(erase),
            DirectoryHandle::Document(d) => d.subscribe(identity).await.map_err(erase),
        }
    }
}

/// Build the session manager for the configured auth backend.
pub fn session_manager(config: &AuthConfig) -> Result<SessionManager, BackendError> {
    match config {
        AuthConfig::Memory => Ok(SessionManager::new(Arc::new(MemoryAuthProvider::new()))),
        AuthConfig::Rest {
            base_url,
            api_key,
            restored_token,
            ..
        } => {
            let provider = RestAuthProvider::new(base_url, api_key)
                .map_err(|e| BackendError(e.to_string()))?;
            Ok(SessionManager::new(Arc::new(provider))
                .with_restored_token(restored_token.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_handle_round_trip() {
        let handle = DirectoryHandle::from_config(&BackendConfig::Memory, None).unwrap();
        let alice = UserId::from("alice");

        let doc = handle
            .insert(&alice, "https://store.example/a", "a.txt")
            .await
            .unwrap();
        assert_eq!(handle.fetch_all().await.unwrap(), vec![doc]);
    }

    #[tokio::test]
    async fn test_memory_handle_is_not_refreshed() {
        let handle = DirectoryHandle::from_config(&BackendConfig::Memory, None).unwrap();
        let refreshed = handle
            .refreshed(&BackendConfig::Memory, Some("token"))
            .unwrap();
        assert!(refreshed.is_none());
    }

    #[test]
    fn test_relational_handle_is_refreshed_with_token() {
        let config = BackendConfig::Relational {
            base_url: url::Url::parse("https://project.example.co").unwrap(),
            api_key: "anon-key".to_string(),
        };
        let handle = DirectoryHandle::from_config(&config, None).unwrap();
        let refreshed = handle.refreshed(&config, Some("token")).unwrap();
        assert!(matches!(refreshed, Some(DirectoryHandle::Relational(_))));
    }
}
