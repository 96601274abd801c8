use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

use common::directory::DirectoryError;
use common::document::DocumentRecord;

use crate::{CommandError, ServiceState};

pub mod delete;
pub mod list;
pub mod revoke;
pub mod share;
pub mod upload;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/upload", post(upload::handler))
        .route("/list", post(list::handler))
        .route("/delete", post(delete::handler))
        .route("/share", post(share::handler))
        .route("/revoke", post(revoke::handler))
        .with_state(state)
}

/// JSON view of a document record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub file_name: String,
    pub uploaded_at: String,
    pub shared_with: Vec<String>,
}

impl From<DocumentRecord> for DocumentView {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id.to_string(),
            owner_id: record.owner.to_string(),
            url: record.url,
            file_name: record.file_name,
            uploaded_at: record
                .uploaded_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| record.uploaded_at.to_string()),
            shared_with: record.shared_with.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// Shared status mapping for command failures.
pub(crate) fn command_error_status(error: &CommandError) -> StatusCode {
    match error {
        CommandError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        CommandError::NoFileSelected | CommandError::InvalidShareTarget => StatusCode::BAD_REQUEST,
        CommandError::Upload(_) => StatusCode::BAD_GATEWAY,
        CommandError::Directory(DirectoryError::NotOwner) => StatusCode::FORBIDDEN,
        CommandError::Directory(DirectoryError::InvalidGrantee) => StatusCode::BAD_REQUEST,
        CommandError::Directory(DirectoryError::NotFound(_)) => StatusCode::NOT_FOUND,
        CommandError::Directory(DirectoryError::Provider(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::UploadError;

    #[test]
    fn test_status_mapping_distinguishes_guard_failures() {
        assert_eq!(
            command_error_status(&CommandError::Directory(DirectoryError::NotOwner)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            command_error_status(&CommandError::Directory(DirectoryError::InvalidGrantee)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            command_error_status(&CommandError::NotReady),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            command_error_status(&CommandError::Upload(UploadError::MissingUrl)),
            StatusCode::BAD_GATEWAY
        );
    }
}
