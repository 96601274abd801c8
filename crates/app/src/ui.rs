//! Transient UI state for the app front end.
//!
//! The browser page is rendered from this state: the mode drives which
//! controls are active, `message` is shown as a modal until dismissed, and
//! the sharing mode carries the record whose grantees are being edited.
//! Every failure path lands back in `Idle` with a surfaced message, so the
//! page always stays interactive.

use common::document::{DocumentRecord, UserId};

/// What the front end is currently doing.
#[derive(Debug, Clone, Default)]
pub enum UiMode {
    #[default]
    Idle,
    /// An upload is in flight; the upload control is disabled best-effort
    Uploading,
    /// The sharing dialog is open for this record
    Sharing(DocumentRecord),
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    mode: UiMode,
    /// Modal message, shown until dismissed
    message: Option<String>,
    /// URL of the most recent successful upload
    last_uploaded: Option<String>,
    /// Pending input in the sharing dialog
    sharee_input: String,
}

impl UiState {
    pub fn mode(&self) -> &UiMode {
        &self.mode
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.mode, UiMode::Uploading)
    }

    pub fn sharing(&self) -> Option<&DocumentRecord> {
        match &self.mode {
            UiMode::Sharing(record) => Some(record),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn last_uploaded(&self) -> Option<&str> {
        self.last_uploaded.as_deref()
    }

    pub fn sharee_input(&self) -> &str {
        &self.sharee_input
    }

    pub fn set_sharee_input(&mut self, input: impl Into<String>) {
        self.sharee_input = input.into();
    }

    /// Idle -> Uploading. The caller has already checked the identity gate.
    pub fn begin_upload(&mut self) {
        self.mode = UiMode::Uploading;
    }

    /// Any mode -> Idle, with a message surfaced in the modal.
    pub fn surface(&mut self, message: impl Into<String>) {
        self.mode = UiMode::Idle;
        self.message = Some(message.into());
    }

    /// Uploading -> Idle on success: remember the URL, confirm in the modal.
    pub fn upload_succeeded(&mut self, url: &str) {
        self.last_uploaded = Some(url.to_string());
        self.surface("Document uploaded successfully!");
    }

    /// Idle -> Sharing, for owner-owned records only. The ownership check
    /// here is a UX guard; the directory enforces it authoritatively.
    pub fn open_share(&mut self, record: DocumentRecord, identity: &UserId) {
        if !record.is_owned_by(identity) {
            self.surface("You can only share documents you own.");
            return;
        }
        self.sharee_input.clear();
        self.mode = UiMode::Sharing(record);
    }

    /// Sharing -> Idle without granting.
    pub fn cancel_share(&mut self) {
        self.sharee_input.clear();
        self.mode = UiMode::Idle;
    }

    /// Sharing -> Idle after a successful grant.
    pub fn share_succeeded(&mut self, file_name: &str, grantee: &UserId) {
        self.sharee_input.clear();
        self.surface(format!(
            "Document '{}' shared with '{}' successfully!",
            file_name, grantee
        ));
    }

    /// Dismiss the modal.
    pub fn close_modal(&mut self) {
        self.message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn record(owner: &str) -> DocumentRecord {
        DocumentRecord {
            id: common::document::DocId::from("d1"),
            owner: UserId::from(owner),
            url: "https://store.example/d1".to_string(),
            file_name: "report.pdf".to_string(),
            uploaded_at: OffsetDateTime::UNIX_EPOCH,
            shared_with: Default::default(),
        }
    }

    #[test]
    fn test_upload_cycle_success() {
        let mut ui = UiState::default();
        ui.begin_upload();
        assert!(ui.is_uploading());

        ui.upload_succeeded("https://store.example/d1");
        assert!(!ui.is_uploading());
        assert_eq!(ui.last_uploaded(), Some("https://store.example/d1"));
        assert!(ui.message().unwrap().contains("successfully"));
    }

    #[test]
    fn test_upload_cycle_failure_returns_to_idle() {
        let mut ui = UiState::default();
        ui.begin_upload();
        ui.surface("Failed to upload document: connection refused");

        assert!(!ui.is_uploading());
        assert!(ui.message().unwrap().contains("Failed to upload"));
        assert!(ui.last_uploaded().is_none());
    }

    #[test]
    fn test_share_requires_ownership() {
        let mut ui = UiState::default();
        let bob = UserId::from("bob");

        ui.open_share(record("alice"), &bob);
        assert!(ui.sharing().is_none());
        assert_eq!(ui.message(), Some("You can only share documents you own."));
    }

    #[test]
    fn test_share_cycle_for_owner() {
        let mut ui = UiState::default();
        let alice = UserId::from("alice");

        ui.open_share(record("alice"), &alice);
        assert!(ui.sharing().is_some());

        ui.set_sharee_input("bob");
        ui.share_succeeded("report.pdf", &UserId::from("bob"));
        assert!(ui.sharing().is_none());
        assert!(ui.message().unwrap().contains("shared with 'bob'"));
        assert_eq!(ui.sharee_input(), "");
    }

    #[test]
    fn test_cancel_share_returns_to_idle_without_message() {
        let mut ui = UiState::default();
        let alice = UserId::from("alice");

        ui.open_share(record("alice"), &alice);
        ui.set_sharee_input("bob");
        ui.cancel_share();

        assert!(ui.sharing().is_none());
        assert!(ui.message().is_none());
        assert_eq!(ui.sharee_input(), "");
    }

    #[test]
    fn test_close_modal_clears_message_only() {
        let mut ui = UiState::default();
        ui.surface("something happened");
        ui.close_modal();
        assert!(ui.message().is_none());
        assert!(!ui.is_uploading());
    }
}
