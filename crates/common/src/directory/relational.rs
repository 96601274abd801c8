use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::watch;
use url::Url;

use super::{DirectoryError, DirectoryFeed, DirectoryProvider, FEED_POLL_INTERVAL};
use crate::document::{DocId, DocumentRecord, UserId};

/// Directory provider for the Postgres-backed realtime service.
///
/// Records are rows in a `documents` table reached over the service's REST
/// surface: lowercase column names, `id=eq.{id}` filters, a `Prefer:
/// return=representation` header to get the inserted row back. Row-level
/// security on the service is assumed to scope reads; the caller
/// self-filters regardless.
///
/// Grantee mutation is a read-modify-write of the whole `sharedwith` array
/// with no concurrency check: two concurrent grants from different sessions
/// can race and the last writer wins at the field level.
#[derive(Debug, Clone)]
pub struct RelationalDirectoryProvider {
    client: Client,
    base: Url,
    table: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RelationalDirectoryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Wire shape of one row in the `documents` table.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<serde_json::Value>,
    filename: String,
    url: String,
    uploadedat: String,
    ownerid: String,
    #[serde(default)]
    sharedwith: Option<Vec<String>>,
}

impl DocumentRow {
    fn into_record(self) -> Result<DocumentRecord, RelationalDirectoryError> {
        let id = match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            other => {
                return Err(RelationalDirectoryError::Malformed(format!(
                    "row id missing or unusable: {:?}",
                    other
                )))
            }
        };
        let uploaded_at = OffsetDateTime::parse(&self.uploadedat, &Rfc3339)
            .map_err(|e| RelationalDirectoryError::Malformed(format!("uploadedat: {}", e)))?;

        Ok(DocumentRecord {
            id: DocId::new(id),
            owner: UserId::new(self.ownerid),
            url: self.url,
            file_name: self.filename,
            uploaded_at,
            shared_with: self
                .sharedwith
                .unwrap_or_default()
                .into_iter()
                .map(UserId::new)
                .collect(),
        })
    }
}

impl RelationalDirectoryProvider {
    /// `base` is the service's project URL; `api_key` the anon key,
    /// `access_token` the session bearer once an identity is resolved.
    pub fn new(
        base: &Url,
        api_key: &str,
        access_token: Option<&str>,
    ) -> Result<Self, RelationalDirectoryError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| RelationalDirectoryError::Malformed(e.to_string()))?,
        );
        let bearer = format!("Bearer {}", access_token.unwrap_or(api_key));
        default_headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| RelationalDirectoryError::Malformed(e.to_string()))?,
        );
        let client = Client::builder().default_headers(default_headers).build()?;

        // Url::join needs a trailing slash to keep the last path segment
        let base = Url::parse(&format!("{}/", base.as_str().trim_end_matches('/')))
            .map_err(|e| RelationalDirectoryError::Malformed(e.to_string()))?;

        Ok(Self {
            client,
            base,
            table: "documents".to_string(),
        })
    }

    fn table_url(&self) -> Result<Url, RelationalDirectoryError> {
        self.base
            .join(&format!("rest/v1/{}", self.table))
            .map_err(|e| RelationalDirectoryError::Malformed(e.to_string()))
    }

    async fn expect_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RelationalDirectoryError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RelationalDirectoryError::Status { status, body })
        }
    }

    /// Unguarded read-modify-write of the grantee array (see type docs).
    async fn write_grantees(
        &self,
        id: &DocId,
        sharedwith: BTreeSet<UserId>,
    ) -> Result<(), DirectoryError<RelationalDirectoryError>> {
        let sharedwith: Vec<&str> = sharedwith.iter().map(|u| u.as_str()).collect();
        let response = self
            .client
            .patch(self.table_url()?)
            .query(&[("id", format!("eq.{}", id))])
            .json(&serde_json::json!({ "sharedwith": sharedwith }))
            .send()
            .await
            .map_err(RelationalDirectoryError::from)?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryProvider for RelationalDirectoryProvider {
    type Error = RelationalDirectoryError;

    async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let response = self
            .client
            .get(self.table_url()?)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(RelationalDirectoryError::from)?;
        let rows: Vec<DocumentRow> = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(RelationalDirectoryError::from)?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))?;
        Ok(row.into_record()?)
    }

    async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let row = DocumentRow {
            id: None,
            filename: file_name.to_string(),
            url: url.to_string(),
            uploadedat: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .map_err(|e| RelationalDirectoryError::Malformed(e.to_string()))?,
            ownerid: owner.to_string(),
            sharedwith: Some(Vec::new()),
        };

        let response = self
            .client
            .post(self.table_url()?)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .map_err(RelationalDirectoryError::from)?;
        let mut rows: Vec<DocumentRow> = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(RelationalDirectoryError::from)?;

        if rows.is_empty() {
            return Err(RelationalDirectoryError::Malformed(
                "insert returned no representation".to_string(),
            )
            .into());
        }
        Ok(rows.remove(0).into_record()?)
    }

    async fn remove(&self, id: &DocId) -> Result<(), DirectoryError<Self::Error>> {
        let response = self
            .client
            .delete(self.table_url()?)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(RelationalDirectoryError::from)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn add_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        let mut sharedwith = self.get(id).await?.shared_with;
        sharedwith.insert(grantee.clone());
        self.write_grantees(id, sharedwith).await
    }

    async fn remove_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        let mut sharedwith = self.get(id).await?.shared_with;
        sharedwith.remove(grantee);
        self.write_grantees(id, sharedwith).await
    }

    async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<Self::Error>> {
        let response = self
            .client
            .get(self.table_url()?)
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(RelationalDirectoryError::from)?;
        let rows: Vec<DocumentRow> = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(RelationalDirectoryError::from)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(row.into_record()?);
        }
        Ok(records)
    }

    async fn subscribe(&self) -> Result<DirectoryFeed, DirectoryError<Self::Error>> {
        let (tx, rx) = watch::channel(Vec::new());
        let provider = self.clone();

        let task = tokio::spawn(async move {
            let mut last: Option<Vec<DocumentRecord>> = None;
            loop {
                match provider.fetch_all().await {
                    Ok(records) => {
                        if last.as_ref() != Some(&records) {
                            last = Some(records.clone());
                            if tx.send(records).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("directory feed poll failed: {}", e);
                    }
                }
                tokio::time::sleep(FEED_POLL_INTERVAL).await;
            }
        });

        Ok(DirectoryFeed::with_task(rx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_decodes_string_and_numeric_ids() {
        let row: DocumentRow = serde_json::from_str(
            r#"{"id": 7, "filename": "a.txt", "url": "https://store.example/a",
                "uploadedat": "2024-01-01T00:00:00+00:00", "ownerid": "alice",
                "sharedwith": ["bob"]}"#,
        )
        .unwrap();
        let record = row.into_record().unwrap();
        assert_eq!(record.id.as_str(), "7");
        assert!(record.grants(&UserId::from("bob")));

        let row: DocumentRow = serde_json::from_str(
            r#"{"id": "d1", "filename": "a.txt", "url": "https://store.example/a",
                "uploadedat": "2024-01-01T00:00:00Z", "ownerid": "alice"}"#,
        )
        .unwrap();
        let record = row.into_record().unwrap();
        assert_eq!(record.id.as_str(), "d1");
        assert!(record.shared_with.is_empty());
    }

    #[test]
    fn test_row_without_id_is_rejected() {
        let row: DocumentRow = serde_json::from_str(
            r#"{"filename": "a.txt", "url": "u", "uploadedat": "2024-01-01T00:00:00Z",
                "ownerid": "alice"}"#,
        )
        .unwrap();
        assert!(matches!(
            row.into_record(),
            Err(RelationalDirectoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_base_url_normalization() {
        let base = Url::parse("https://project.example.co").unwrap();
        let provider = RelationalDirectoryProvider::new(&base, "anon-key", None).unwrap();
        assert_eq!(
            provider.table_url().unwrap().as_str(),
            "https://project.example.co/rest/v1/documents"
        );
    }
}
