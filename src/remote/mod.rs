//! Remote content store
//!
//! The sync core only ever talks to the remote endpoint through the
//! [`RemoteStore`] trait; the production implementation is a WebDAV client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest_dav::{Auth, ClientBuilder, Depth};
use thiserror::Error;

/// Per-request timeout for remote calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Remote store errors
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No remote store is bound
    #[error("remote store not configured")]
    NotConfigured,

    /// Upload failed
    #[error("upload failed: {0}")]
    Upload(String),

    /// Download failed
    #[error("download failed: {0}")]
    Download(String),

    /// Connection test or client construction failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// The endpoint URL is empty
    #[error("remote URL cannot be empty")]
    EmptyUrl,
}

/// Capability contract consumed by the sync core
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload `content` to `remote_path`
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), RemoteError>;

    /// Download the content stored at `remote_path`
    async fn download(&self, remote_path: &str) -> Result<String, RemoteError>;

    /// Probe the endpoint for reachability and valid credentials
    async fn test_connection(&self) -> Result<(), RemoteError>;
}

/// WebDAV-backed remote store
pub struct WebDavStore {
    client: reqwest_dav::Client,
}

impl WebDavStore {
    /// Create a store bound to `url` with basic-auth credentials
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self, RemoteError> {
        if url.is_empty() {
            return Err(RemoteError::EmptyUrl);
        }

        let agent = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Connect(e.to_string()))?;

        let client = ClientBuilder::new()
            .set_agent(agent)
            .set_host(url.to_string())
            .set_auth(Auth::Basic(username.to_string(), password.to_string()))
            .build()
            .map_err(|e| RemoteError::Connect(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteStore for WebDavStore {
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), RemoteError> {
        self.client
            .put(remote_path, content.as_bytes().to_vec())
            .await
            .map_err(|e| RemoteError::Upload(e.to_string()))
    }

    async fn download(&self, remote_path: &str) -> Result<String, RemoteError> {
        let response = self
            .client
            .get(remote_path)
            .await
            .map_err(|e| RemoteError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Download(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Download(e.to_string()))?;

        String::from_utf8(body.to_vec()).map_err(|e| RemoteError::Download(e.to_string()))
    }

    async fn test_connection(&self) -> Result<(), RemoteError> {
        self.client
            .list("", Depth::Number(0))
            .await
            .map(|_| ())
            .map_err(|e| RemoteError::Connect(e.to_string()))
    }
}
