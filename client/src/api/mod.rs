//! Remote collaborators of the coordinator.
//!
//! The coordinator only sees the three traits below. [`ApiClient`] implements
//! all of them against the REST backend; tests substitute their own.

pub mod assets;
pub mod requests;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::models::{
    asset::{Asset, Category, SubCategory},
    common::{DbId, RequestFilter},
    request::{AssetRequest, SubmissionPayload},
};

/// Errors from the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Network, TLS, timeout or body decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Persistence for asset requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn list_filtered(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<AssetRequest>, RemoteError>;

    /// `Ok` means the store acknowledged the write. The echoed record is
    /// returned when the response body carries one.
    async fn create(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<Option<AssetRequest>, RemoteError>;

    async fn update(
        &self,
        id: DbId,
        payload: &SubmissionPayload,
    ) -> Result<Option<AssetRequest>, RemoteError>;
}

/// Read-only reference data.
#[async_trait]
pub trait AssetDirectory: Send + Sync {
    async fn list_assets(&self) -> Result<Vec<Asset>, RemoteError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RemoteError>;

    /// `None` asks for every sub-category. An empty result is a valid answer.
    async fn list_sub_categories(
        &self,
        category_id: Option<DbId>,
    ) -> Result<Vec<SubCategory>, RemoteError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when the user does not exist or has no name.
    async fn resolve_user_name(&self, user_id: &str) -> Result<Option<String>, RemoteError>;
}

/// Bearer-authenticated HTTP client for the asset-management backend.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    users_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(cfg: &Config) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.api_url.clone(),
            users_url: cfg.user_directory_url.clone(),
            token: cfg.token.clone(),
        })
    }

    /// Reuse an existing [`reqwest::Client`]. `base_url` must end with `/`;
    /// the user directory defaults to `<base_url>Users`.
    pub fn with_client(client: reqwest::Client, base_url: String, token: String) -> Self {
        let users_url = format!("{}Users", base_url);
        Self {
            client,
            base_url,
            users_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        tracing::debug!("GET {}", url);
        self.client.get(url).bearer_auth(&self.token)
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        tracing::debug!("POST {}", url);
        self.client.post(url).bearer_auth(&self.token)
    }

    fn put(&self, url: String) -> reqwest::RequestBuilder {
        tracing::debug!("PUT {}", url);
        self.client.put(url).bearer_auth(&self.token)
    }

    // ---- private helpers ----

    /// Pass a 2xx response through, or turn anything else into
    /// [`RemoteError::Status`] carrying the body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Like [`Self::parse_response`], but a body that is empty or not a `T`
    /// still counts as success.
    async fn parse_acknowledgement<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).ok())
    }
}
