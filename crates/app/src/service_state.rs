use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

use common::directory::DirectoryError;
use common::document::{DocId, DocumentRecord, UserId};
use common::session::{Session, SessionManager, SessionState};
use common::storage::{ObjectStoreClient, UploadError};

use crate::backend::{self, BackendError, DirectoryHandle};
use crate::service_config::Config;
use crate::ui::UiState;

/// Shared state behind the app server: the resolved session, the configured
/// directory backend, the object-store client, the transient UI state, and
/// the latest visible-document snapshot published by the sync task.
///
/// The command methods here are the presentation layer's orchestration:
/// they gate on a resolved identity, duplicate the ownership checks as UX
/// guards (the directory enforces them authoritatively), drive the UI state
/// machine, and surface every outcome as a modal message.
#[derive(Debug, Clone)]
pub struct State {
    config: Arc<Config>,
    session: SessionManager,
    directory: Arc<parking_lot::RwLock<DirectoryHandle>>,
    store: ObjectStoreClient,
    ui: Arc<parking_lot::RwLock<UiState>>,
    docs_tx: Arc<watch::Sender<Vec<DocumentRecord>>>,
    docs_rx: watch::Receiver<Vec<DocumentRecord>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("App not fully initialized. Please wait.")]
    NotReady,
    #[error("Please select a file to upload.")]
    NoFileSelected,
    #[error("Invalid sharing details.")]
    InvalidShareTarget,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Directory(#[from] DirectoryError<BackendError>),
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let session = backend::session_manager(&config.auth)?;
        let directory = DirectoryHandle::from_config(&config.backend, None)?;
        let store = ObjectStoreClient::new(
            config.object_store.upload_url.clone(),
            config.object_store.upload_preset.clone(),
        );
        let (docs_tx, docs_rx) = watch::channel(Vec::new());

        Ok(Self {
            config: Arc::new(config.clone()),
            session,
            directory: Arc::new(parking_lot::RwLock::new(directory)),
            store,
            ui: Arc::new(parking_lot::RwLock::new(UiState::default())),
            docs_tx: Arc::new(docs_tx),
            docs_rx,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn directory(&self) -> DirectoryHandle {
        self.directory.read().clone()
    }

    pub fn store(&self) -> &ObjectStoreClient {
        &self.store
    }

    pub fn ui(&self) -> &Arc<parking_lot::RwLock<UiState>> {
        &self.ui
    }

    pub fn identity(&self) -> Option<UserId> {
        self.session.identity()
    }

    /// The latest visible-document snapshot from the sync task.
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.docs_rx.borrow().clone()
    }

    pub fn documents_rx(&self) -> watch::Receiver<Vec<DocumentRecord>> {
        self.docs_rx.clone()
    }

    /// Publish a fresh visible snapshot (sync task only).
    pub fn publish_documents(&self, documents: Vec<DocumentRecord>) {
        let _ = self.docs_tx.send(documents);
    }

    /// Swap in a directory handle authenticated as the new session, where
    /// the configured dialect needs one.
    pub fn refresh_directory(&self, access_token: Option<&str>) -> Result<(), BackendError> {
        let refreshed = self
            .directory
            .read()
            .refreshed(&self.config.backend, access_token)?;
        if let Some(handle) = refreshed {
            *self.directory.write() = handle;
        }
        Ok(())
    }

    /// Identity gate: every document operation requires a resolved session.
    fn require_session(&self) -> Result<Session, CommandError> {
        match self.session.state() {
            SessionState::Ready(session) => Ok(session),
            _ => {
                self.ui
                    .write()
                    .surface("App not fully initialized. Please wait.");
                Err(CommandError::NotReady)
            }
        }
    }

    fn find_document(&self, id: &DocId) -> Option<DocumentRecord> {
        self.docs_rx.borrow().iter().find(|r| &r.id == id).cloned()
    }

    /// Upload a blob, then record it. The two steps are not atomic: if the
    /// insert fails the blob stays orphaned at the store, with no cleanup.
    pub async fn upload_document(
        &self,
        file_name: &str,
        data: Bytes,
    ) -> Result<DocumentRecord, CommandError> {
        let session = self.require_session()?;
        if file_name.is_empty() {
            self.ui.write().surface("Please select a file to upload.");
            return Err(CommandError::NoFileSelected);
        }

        self.ui.write().begin_upload();

        let url = match self.store.upload(file_name, data).await {
            Ok(url) => url,
            Err(e) => {
                self.ui
                    .write()
                    .surface(format!("Failed to upload document: {}", e));
                return Err(e.into());
            }
        };

        match self
            .directory()
            .insert(&session.user_id, url.as_str(), file_name)
            .await
        {
            Ok(record) => {
                self.ui.write().upload_succeeded(url.as_str());
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    "uploaded blob left unrecorded after failed insert"
                );
                self.ui
                    .write()
                    .surface(format!("Failed to save document: {}", e));
                Err(e.into())
            }
        }
    }

    pub async fn delete_document(&self, id: &DocId) -> Result<(), CommandError> {
        let session = self.require_session()?;

        if let Some(record) = self.find_document(id) {
            if !record.is_owned_by(&session.user_id) {
                self.ui
                    .write()
                    .surface("You can only delete documents you own.");
                return Err(DirectoryError::NotOwner.into());
            }
        }

        match self.directory().delete(id, &session.user_id).await {
            Ok(()) => {
                self.ui.write().surface("Document deleted successfully!");
                Ok(())
            }
            Err(e) => {
                self.ui
                    .write()
                    .surface(format!("Failed to delete document: {}", e));
                Err(e.into())
            }
        }
    }

    /// Open the sharing dialog for a record (owner only, UX guard).
    pub fn open_share(&self, id: &DocId) -> Result<(), CommandError> {
        let session = self.require_session()?;
        let record = self
            .find_document(id)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))?;
        self.ui.write().open_share(record, &session.user_id);
        Ok(())
    }

    pub fn cancel_share(&self) {
        self.ui.write().cancel_share();
    }

    pub fn close_modal(&self) {
        self.ui.write().close_modal();
    }

    /// Grant read access, returning the updated record.
    pub async fn share_document(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<DocumentRecord, CommandError> {
        let session = self.require_session()?;

        let grantee = grantee.as_str().trim();
        if grantee.is_empty() {
            self.ui.write().surface("Invalid sharing details.");
            return Err(CommandError::InvalidShareTarget);
        }
        let grantee = UserId::from(grantee);

        if grantee == session.user_id {
            self.ui
                .write()
                .surface("You cannot share a document with yourself.");
            return Err(DirectoryError::InvalidGrantee.into());
        }
        if let Some(record) = self.find_document(id) {
            if !record.is_owned_by(&session.user_id) {
                self.ui
                    .write()
                    .surface("You can only share documents you own.");
                return Err(DirectoryError::NotOwner.into());
            }
        }

        match self.directory().grant(id, &session.user_id, &grantee).await {
            Ok(()) => {
                let record = self.directory().get(id).await?;
                self.ui.write().share_succeeded(&record.file_name, &grantee);
                Ok(record)
            }
            Err(e) => {
                self.ui
                    .write()
                    .surface(format!("Failed to share document: {}", e));
                Err(e.into())
            }
        }
    }

    /// Revoke read access, returning the updated record.
    pub async fn revoke_access(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<DocumentRecord, CommandError> {
        let session = self.require_session()?;

        if let Some(record) = self.find_document(id) {
            if !record.is_owned_by(&session.user_id) {
                self.ui
                    .write()
                    .surface("You can only revoke access for documents you own.");
                return Err(DirectoryError::NotOwner.into());
            }
        }

        match self
            .directory()
            .revoke(id, &session.user_id, grantee)
            .await
        {
            Ok(()) => {
                let record = self.directory().get(id).await?;
                self.ui.write().surface(format!(
                    "Access revoked for '{}' on document '{}'.",
                    grantee, record.file_name
                ));
                Ok(record)
            }
            Err(e) => {
                self.ui
                    .write()
                    .surface(format!("Failed to revoke access: {}", e));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AuthConfig, BackendConfig, ObjectStoreConfig};

    fn test_config() -> Config {
        Config {
            backend: BackendConfig::Memory,
            auth: AuthConfig::Memory,
            object_store: ObjectStoreConfig::default(),
            app_port: 0,
            log_level: tracing::Level::DEBUG,
            log_dir: None,
        }
    }

    #[tokio::test]
    async fn test_commands_refused_without_identity() {
        let state = State::from_config(&test_config()).unwrap();

        let result = state
            .upload_document("a.txt", Bytes::from_static(b"hello"))
            .await;
        assert!(matches!(result, Err(CommandError::NotReady)));
        assert_eq!(
            state.ui().read().message(),
            Some("App not fully initialized. Please wait.")
        );
    }

    #[tokio::test]
    async fn test_upload_requires_selected_file() {
        let state = State::from_config(&test_config()).unwrap();
        state.session().resolve().await.unwrap();

        let result = state.upload_document("", Bytes::new()).await;
        assert!(matches!(result, Err(CommandError::NoFileSelected)));
        assert_eq!(
            state.ui().read().message(),
            Some("Please select a file to upload.")
        );
    }

    #[tokio::test]
    async fn test_share_refuses_blank_and_self_targets() {
        let state = State::from_config(&test_config()).unwrap();
        let session = state.session().resolve().await.unwrap();
        let doc = state
            .directory()
            .insert(&session.user_id, "https://store.example/a", "a.txt")
            .await
            .unwrap();

        let result = state.share_document(&doc.id, &UserId::from("  ")).await;
        assert!(matches!(result, Err(CommandError::InvalidShareTarget)));

        let result = state.share_document(&doc.id, &session.user_id).await;
        assert!(matches!(
            result,
            Err(CommandError::Directory(DirectoryError::InvalidGrantee))
        ));
    }
}
