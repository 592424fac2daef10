//! Remote access façades for the backing store
//!
//! One façade per entity type with a uniform contract: list/get/create/
//! update/remove, plus the relationship and filter operations an entity
//! supports. Side effects are confined to network I/O; there is no caching
//! layer here, so every call reflects remote state at time of call.
//!
//! Shared plumbing lives in [`ApiClient`]: request construction against the
//! configured base URL and uniform decoding of responses into the common
//! error taxonomy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use waymark_common::config::ClientConfig;
use waymark_common::{Error, Result};

mod places;
mod routes;
mod users;

pub use places::PlaceClient;
pub use routes::RouteClient;
pub use users::UserClient;

const USER_AGENT: &str = concat!("waymark/", env!("CARGO_PKG_VERSION"));

/// Map a non-2xx response status to the error taxonomy
///
/// 404 is an explicit miss from the store; everything else non-2xx is a
/// transport-level failure.
fn classify_status(status: reqwest::StatusCode, path: &str, body: &str) -> Error {
    if status == reqwest::StatusCode::NOT_FOUND {
        Error::NotFound(path.to_string())
    } else {
        Error::Transport(format!("{} returned {}: {}", path, status, body))
    }
}

/// Shared HTTP plumbing for the entity façades
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build the underlying HTTP client from resolved configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    /// Base URL this client was configured with
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body));
        }
        response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("{}: undecodable body: {}", path, e)))
    }

    async fn expect_success(path: &str, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, path, &body));
        }
        Ok(())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path = %path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("GET {}: {}", path, e)))?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!(path = %path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("POST {}: {}", path, e)))?;
        Self::decode(path, response).await
    }

    /// POST with no request or response body (association mutations)
    pub(crate) async fn post_empty(&self, path: &str) -> Result<()> {
        tracing::debug!(path = %path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("POST {}: {}", path, e)))?;
        Self::expect_success(path, response).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!(path = %path, "PUT");
        let response = self
            .http
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("PUT {}: {}", path, e)))?;
        Self::decode(path, response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        tracing::debug!(path = %path, "DELETE");
        let response = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Transport(format!("DELETE {}: {}", path, e)))?;
        Self::expect_success(path, response).await
    }
}
