use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::watch;
use url::Url;

use super::{DirectoryError, DirectoryFeed, DirectoryProvider, FEED_POLL_INTERVAL};
use crate::document::{DocId, DocumentRecord, UserId};

/// Directory provider for the document-oriented realtime service.
///
/// Records live in a `documents` collection under an application-scoped
/// path. Field values travel in the service's typed JSON envelopes
/// (`stringValue`, `timestampValue`, `arrayValue`); the service assigns the
/// document name on create. Grantee mutation uses the service's native
/// array-union / array-remove field transforms in a `:commit` write, which
/// are atomic server-side -- this dialect has no read-modify-write race.
#[derive(Debug, Clone)]
pub struct DocumentDirectoryProvider {
    client: Client,
    base: Url,
    project_id: String,
    app_id: String,
    api_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentDirectoryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// One typed value envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_value: Option<ArrayValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ArrayValue {
    #[serde(default)]
    values: Vec<TypedValue>,
}

impl TypedValue {
    fn string(s: impl Into<String>) -> Self {
        Self {
            string_value: Some(s.into()),
            ..Default::default()
        }
    }

    fn timestamp(ts: &str) -> Self {
        Self {
            timestamp_value: Some(ts.to_string()),
            ..Default::default()
        }
    }

    fn string_array<'a>(items: impl Iterator<Item = &'a str>) -> Self {
        Self {
            array_value: Some(ArrayValue {
                values: items.map(TypedValue::string).collect(),
            }),
            ..Default::default()
        }
    }

    fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    fn as_strings(&self) -> Vec<String> {
        self.array_value
            .as_ref()
            .map(|a| {
                a.values
                    .iter()
                    .filter_map(|v| v.string_value.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordFields {
    #[serde(rename = "fileName")]
    file_name: TypedValue,
    url: TypedValue,
    #[serde(rename = "uploadedAt")]
    uploaded_at: TypedValue,
    #[serde(rename = "ownerId")]
    owner_id: TypedValue,
    #[serde(rename = "sharedWith", default, skip_serializing_if = "Option::is_none")]
    shared_with: Option<TypedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    fields: RecordFields,
}

#[derive(Debug, Default, Deserialize)]
struct CollectionPage {
    #[serde(default)]
    documents: Vec<StoredDocument>,
}

impl StoredDocument {
    fn into_record(self) -> Result<DocumentRecord, DocumentDirectoryError> {
        let name = self
            .name
            .ok_or_else(|| DocumentDirectoryError::Malformed("document has no name".into()))?;
        // The record id is the last segment of the resource name
        let id = name
            .rsplit('/')
            .next()
            .unwrap_or(&name)
            .to_string();

        let missing = |field: &str| DocumentDirectoryError::Malformed(format!("missing {}", field));

        let uploaded_at_raw = self
            .fields
            .uploaded_at
            .timestamp_value
            .clone()
            .ok_or_else(|| missing("uploadedAt"))?;
        let uploaded_at = OffsetDateTime::parse(&uploaded_at_raw, &Rfc3339)
            .map_err(|e| DocumentDirectoryError::Malformed(format!("uploadedAt: {}", e)))?;

        Ok(DocumentRecord {
            id: DocId::new(id),
            owner: UserId::new(self.fields.owner_id.as_str().ok_or_else(|| missing("ownerId"))?),
            url: self
                .fields
                .url
                .as_str()
                .ok_or_else(|| missing("url"))?
                .to_string(),
            file_name: self
                .fields
                .file_name
                .as_str()
                .ok_or_else(|| missing("fileName"))?
                .to_string(),
            uploaded_at,
            shared_with: self
                .fields
                .shared_with
                .map(|v| v.as_strings())
                .unwrap_or_default()
                .into_iter()
                .map(UserId::new)
                .collect(),
        })
    }
}

impl DocumentDirectoryProvider {
    pub fn new(
        base: &Url,
        project_id: &str,
        app_id: &str,
        api_key: &str,
    ) -> Result<Self, DocumentDirectoryError> {
        let base = Url::parse(&format!("{}/", base.as_str().trim_end_matches('/')))
            .map_err(|e| DocumentDirectoryError::Malformed(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base,
            project_id: project_id.to_string(),
            app_id: app_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Resource path of the application-scoped parent document.
    fn parent(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents/apps/{}",
            self.project_id, self.app_id
        )
    }

    /// Full resource name of one record.
    fn doc_name(&self, id: &DocId) -> String {
        format!("{}/documents/{}", self.parent(), id)
    }

    fn join(&self, path: &str) -> Result<Url, DocumentDirectoryError> {
        self.base
            .join(path)
            .map_err(|e| DocumentDirectoryError::Malformed(e.to_string()))
    }

    async fn expect_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DocumentDirectoryError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DocumentDirectoryError::Status { status, body })
        }
    }

    /// Apply one array field transform to a record's `sharedWith`.
    async fn transform_grantees(
        &self,
        id: &DocId,
        transform: &str,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<DocumentDirectoryError>> {
        let commit_url = self.join(&format!(
            "projects/{}/databases/(default)/documents:commit",
            self.project_id
        ))?;
        // The transform kind is the JSON key, so the object is built by hand
        let mut field_transform = serde_json::Map::new();
        field_transform.insert(
            "fieldPath".to_string(),
            serde_json::Value::String("sharedWith".to_string()),
        );
        field_transform.insert(
            transform.to_string(),
            serde_json::json!({ "values": [{ "stringValue": grantee.as_str() }] }),
        );
        let body = serde_json::json!({
            "writes": [{
                "transform": {
                    "document": self.doc_name(id),
                    "fieldTransforms": [field_transform]
                }
            }]
        });

        let response = self
            .client
            .post(commit_url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(DocumentDirectoryError::from)?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DirectoryProvider for DocumentDirectoryProvider {
    type Error = DocumentDirectoryError;

    async fn get(&self, id: &DocId) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let response = self
            .client
            .get(self.join(&self.doc_name(id))?)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(DocumentDirectoryError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(id.clone()));
        }
        let stored: StoredDocument = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(DocumentDirectoryError::from)?;
        Ok(stored.into_record()?)
    }

    async fn insert(
        &self,
        owner: &UserId,
        url: &str,
        file_name: &str,
    ) -> Result<DocumentRecord, DirectoryError<Self::Error>> {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| DocumentDirectoryError::Malformed(e.to_string()))?;
        let body = StoredDocument {
            name: None,
            fields: RecordFields {
                file_name: TypedValue::string(file_name),
                url: TypedValue::string(url),
                uploaded_at: TypedValue::timestamp(&now),
                owner_id: TypedValue::string(owner.as_str()),
                shared_with: Some(TypedValue::string_array(std::iter::empty::<&str>())),
            },
        };

        let response = self
            .client
            .post(self.join(&format!("{}/documents", self.parent()))?)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(DocumentDirectoryError::from)?;
        let stored: StoredDocument = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(DocumentDirectoryError::from)?;
        Ok(stored.into_record()?)
    }

    async fn remove(&self, id: &DocId) -> Result<(), DirectoryError<Self::Error>> {
        let response = self
            .client
            .delete(self.join(&self.doc_name(id))?)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(DocumentDirectoryError::from)?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn add_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        self.transform_grantees(id, "appendMissingElements", grantee)
            .await
    }

    async fn remove_grantee(
        &self,
        id: &DocId,
        grantee: &UserId,
    ) -> Result<(), DirectoryError<Self::Error>> {
        self.transform_grantees(id, "removeAllFromArray", grantee)
            .await
    }

    async fn fetch_all(&self) -> Result<Vec<DocumentRecord>, DirectoryError<Self::Error>> {
        let response = self
            .client
            .get(self.join(&format!("{}/documents", self.parent()))?)
            .query(&[("key", &self.api_key)])
            .send()
            .await
            .map_err(DocumentDirectoryError::from)?;
        let page: CollectionPage = Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(DocumentDirectoryError::from)?;

        let mut records = Vec::with_capacity(page.documents.len());
        for stored in page.documents {
            records.push(stored.into_record()?);
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

    fn provider() -> DocumentDirectoryProvider {
        DocumentDirectoryProvider::new(
            &Url::parse("https://docs.example/v1").unwrap(),
            "proj-1",
            "app-1",
            "key-1",
        )
        .unwrap()
    }

    #[test]
    fn test_doc_name_layout() {
        let p = provider();
        assert_eq!(
            p.doc_name(&DocId::from("d1")),
            "projects/proj-1/databases/(default)/documents/apps/app-1/documents/d1"
        );
    }

    #[test]
    fn test_stored_document_decodes() {
        let stored: StoredDocument = serde_json::from_str(
            r#"{
                "name": "projects/p/databases/(default)/documents/apps/a/documents/d1",
                "fields": {
                    "fileName": { "stringValue": "a.txt" },
                    "url": { "stringValue": "https://store.example/a" },
                    "uploadedAt": { "timestampValue": "2024-01-01T00:00:00Z" },
                    "ownerId": { "stringValue": "alice" },
                    "sharedWith": { "arrayValue": { "values": [{ "stringValue": "bob" }] } }
                }
            }"#,
        )
        .unwrap();

        let record = stored.into_record().unwrap();
        assert_eq!(record.id.as_str(), "d1");
        assert_eq!(record.owner, UserId::from("alice"));
        assert!(record.grants(&UserId::from("bob")));
    }

    #[test]
    fn test_empty_shared_with_decodes() {
        let stored: StoredDocument = serde_json::from_str(
            r#"{
                "name": "projects/p/databases/(default)/documents/apps/a/documents/d2",
                "fields": {
                    "fileName": { "stringValue": "b.txt" },
                    "url": { "stringValue": "https://store.example/b" },
                    "uploadedAt": { "timestampValue": "2024-01-01T00:00:00.000000Z" },
                    "ownerId": { "stringValue": "alice" }
                }
            }"#,
        )
        .unwrap();

        let record = stored.into_record().unwrap();
        assert!(record.shared_with.is_empty());
    }

    #[test]
    fn test_record_fields_serialize_camel_case() {
        let fields = RecordFields {
            file_name: TypedValue::string("a.txt"),
            url: TypedValue::string("u"),
            uploaded_at: TypedValue::timestamp("2024-01-01T00:00:00Z"),
            owner_id: TypedValue::string("alice"),
            shared_with: Some(TypedValue::string_array(["bob"].into_iter())),
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert!(json.get("fileName").is_some());
        assert!(json.get("sharedWith").is_some());
        assert_eq!(
            json["sharedWith"]["arrayValue"]["values"][0]["stringValue"],
            "bob"
        );
    }
}
