use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{AuthError, AuthProvider, Session};
use crate::document::UserId;

/// The server-side message emitted when anonymous issuance is switched off.
const ANONYMOUS_DISABLED_MARKER: &str = "Anonymous sign-ins are disabled";

/// Auth client for the hosted identity service.
///
/// Anonymous identities are issued by an empty `signup` call; custom tokens
/// are exchanged at the `token` endpoint; a stored access token is validated
/// by fetching the `user` resource with it.
#[derive(Debug, Clone)]
pub struct RestAuthProvider {
    client: Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
}

/// The service is not consistent about its error field name.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg.or(self.message).or(self.error_description)
    }
}

impl RestAuthProvider {
    /// `base` is the auth endpoint root (e.g. `https://{project}/auth/v1`).
    pub fn new(base: &Url, api_key: &str) -> Result<Self, AuthError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "apikey",
            HeaderValue::from_str(api_key).map_err(|e| AuthError::Malformed(e.to_string()))?,
        );
        let client = Client::builder().default_headers(default_headers).build()?;

        let base = Url::parse(&format!("{}/", base.as_str().trim_end_matches('/')))
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        self.base
            .join(path)
            .map_err(|e| AuthError::Malformed(e.to_string()))
    }

    async fn reject(response: reqwest::Response) -> AuthError {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or(text);

        if message.contains(ANONYMOUS_DISABLED_MARKER) {
            AuthError::AnonymousDisabled
        } else {
            AuthError::Rejected(message)
        }
    }

    async fn session_from(response: reqwest::Response) -> Result<Session, AuthError> {
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(Session {
            user_id: UserId::new(body.user.id),
            access_token: body.access_token,
        })
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.endpoint("signup")?)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        Self::session_from(response).await
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.endpoint("token")?)
            .query(&[("grant_type", "custom_token")])
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;
        Self::session_from(response).await
    }

    async fn current_user(&self, access_token: &str) -> Result<UserId, AuthError> {
        let response = self
            .client
            .get(self.endpoint("user")?)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::SessionExpired);
        }
        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }
        let body: UserBody = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(UserId::new(body.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_field_fallbacks() {
        let body: ErrorBody = serde_json::from_str(r#"{"msg": "nope"}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), "nope");

        let body: ErrorBody =
            serde_json::from_str(r#"{"error_description": "bad token"}"#).unwrap();
        assert_eq!(body.into_message().unwrap(), "bad token");

        let body: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.into_message().is_none());
    }

    #[test]
    fn test_endpoint_layout() {
        let provider = RestAuthProvider::new(
            &Url::parse("https://project.example.co/auth/v1").unwrap(),
            "anon-key",
        )
        .unwrap();
        assert_eq!(
            provider.endpoint("signup").unwrap().as_str(),
            "https://project.example.co/auth/v1/signup"
        );
    }
}
