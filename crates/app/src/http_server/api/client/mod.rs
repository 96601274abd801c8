mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

use reqwest::{Client, RequestBuilder};
use url::Url;

/// One API operation: how to build the outgoing request, and what comes
/// back. Implemented by each operation's request struct so the CLI can
/// drive the same surface the browser does.
pub trait ApiRequest {
    type Response: serde::de::DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder;
}
