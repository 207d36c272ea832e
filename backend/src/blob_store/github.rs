//! GitHub contents API client
//!
//! Stores attachment bytes as files in a GitHub repository. Blobs are served
//! publicly from the raw-content host, so the URL of an upload is known as
//! soon as the write succeeds.

use super::{BlobMetadata, BlobStore, BlobStoreError};
use crate::config::BlobStoreConfig;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: BlobMetadata,
}

#[derive(Debug, Serialize)]
struct DeleteContentsRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// Blob store backed by a GitHub repository
pub struct GithubBlobStore {
    client: Client,
    config: BlobStoreConfig,
    token: String,
}

impl GithubBlobStore {
    /// Create a client with its own connection pool
    ///
    /// # Errors
    /// * `BlobStoreError::NotConfigured` if the token or repository is missing
    pub fn new(config: BlobStoreConfig) -> Result<Self, BlobStoreError> {
        Self::with_client(Client::new(), config)
    }

    /// Create a client that shares an existing `reqwest::Client`
    pub fn with_client(client: Client, config: BlobStoreConfig) -> Result<Self, BlobStoreError> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| BlobStoreError::NotConfigured("missing GITHUB_TOKEN".to_string()))?;

        let mut parts = config.repository.split('/');
        let valid_repository = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !valid_repository {
            return Err(BlobStoreError::NotConfigured(format!(
                "GITHUB_REPO must look like owner/name, got '{}'",
                config.repository
            )));
        }

        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, &self.config.user_agent)
    }

    /// Send a request and turn any non-2xx answer into `BlobStoreError::Remote`
    async fn send(&self, request: RequestBuilder) -> Result<Response, BlobStoreError> {
        let response = self.authorized(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::debug!(
                status_code = status.as_u16(),
                error_body = %body,
                "Contents API returned error status"
            );

            return Err(BlobStoreError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl BlobStore for GithubBlobStore {
    fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    async fn put_blob(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        previous_digest: Option<&str>,
    ) -> Result<BlobMetadata, BlobStoreError> {
        let url = self.config.contents_url(path);
        tracing::debug!(
            url = %url,
            content_len = content_base64.len(),
            overwrite = previous_digest.is_some(),
            "Uploading blob"
        );

        let body = PutContentsRequest {
            message,
            content: content_base64,
            branch: &self.config.branch,
            sha: previous_digest,
        };
        let response = self.send(self.client.put(&url).json(&body)).await?;

        let parsed: PutContentsResponse = response.json().await.map_err(|e| {
            BlobStoreError::InvalidResponse(format!("failed to parse upload response: {}", e))
        })?;

        Ok(parsed.content)
    }

    async fn get_blob_metadata(&self, path: &str) -> Result<BlobMetadata, BlobStoreError> {
        let url = self.config.contents_url(path);
        tracing::debug!(url = %url, "Fetching blob metadata");

        let request = self
            .client
            .get(&url)
            .query(&[("ref", self.config.branch.as_str())]);
        let response = self.send(request).await?;

        // A directory path answers with a JSON array, which fails here.
        response.json::<BlobMetadata>().await.map_err(|e| {
            BlobStoreError::InvalidResponse(format!("failed to parse metadata for {}: {}", path, e))
        })
    }

    async fn delete_blob(
        &self,
        path: &str,
        digest: &str,
        message: &str,
    ) -> Result<(), BlobStoreError> {
        let url = self.config.contents_url(path);
        tracing::debug!(url = %url, digest = %digest, "Deleting blob");

        let body = DeleteContentsRequest {
            message,
            sha: digest,
            branch: &self.config.branch,
        };
        self.send(self.client.delete(&url).json(&body)).await?;

        Ok(())
    }
}
