//! [`AssetStore`] backed by the GitHub repository contents API.
//!
//! Three endpoints are used:
//! - `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}` to test for
//!   existence and read the blob SHA (the revision token)
//! - `PUT` on the same path without `sha` to create
//! - `PUT` on the same path with `sha` to update
//!
//! Payloads are base64 encoded as the API requires.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{AssetStore, PublishError, Revision, escape_path};
use crate::config::RepoId;
use crate::user_agent;

/// Public GitHub REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const API_CONNECT_TIMEOUT_SECS: u64 = 10;
const API_READ_TIMEOUT_SECS: u64 = 60;

/// Contents API client scoped to one repository branch.
#[derive(Clone)]
pub struct GitHubStore {
    client: Client,
    api_base: Url,
    repo: RepoId,
    branch: String,
    token: String,
}

impl std::fmt::Debug for GitHubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubStore")
            .field("api_base", &self.api_base.as_str())
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubStore {
    /// Creates a store for `repo` on `branch`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] when `api_base` is not a valid URL or
    /// the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        repo: RepoId,
        branch: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, PublishError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| PublishError::config(format!("invalid API base URL {api_base}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(API_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(API_READ_TIMEOUT_SECS))
            .user_agent(user_agent::default_user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| PublishError::config(format!("failed to build API client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            repo,
            branch: branch.into(),
            token: token.into(),
        })
    }

    /// Returns the target branch.
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the target repository.
    #[must_use]
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    fn contents_url(&self, path: &str) -> Result<Url, PublishError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        let raw = format!(
            "{base}/repos/{}/{}/contents/{}",
            urlencoding::encode(self.repo.owner()),
            urlencoding::encode(self.repo.name()),
            escape_path(path)
        );
        Url::parse(&raw).map_err(|e| PublishError::config(format!("invalid contents URL {raw}: {e}")))
    }

    async fn put_contents(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        sha: Option<&str>,
    ) -> Result<(), PublishError> {
        let url = self.contents_url(path)?;
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.branch,
            sha,
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::network(path, e))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            debug!(path, status = status.as_u16(), "contents written");
            return Ok(());
        }
        Err(error_from_response(path, response).await)
    }
}

#[async_trait]
impl AssetStore for GitHubStore {
    fn describe(&self) -> String {
        format!("github:{}@{}", self.repo, self.branch)
    }

    #[instrument(skip(self), fields(branch = %self.branch))]
    async fn lookup(&self, path: &str) -> Result<Option<Revision>, PublishError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PublishError::network(path, e))?;

        match response.status() {
            StatusCode::OK => {
                let metadata: ContentMetadata = response.json().await.map_err(|e| {
                    PublishError::invalid_response(path, format!("missing blob sha: {e}"))
                })?;
                Ok(Some(Revision::new(metadata.sha)))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(error_from_response(path, response).await),
        }
    }

    #[instrument(skip(self, message, content), fields(bytes = content.len()))]
    async fn create(&self, path: &str, message: &str, content: &[u8]) -> Result<(), PublishError> {
        self.put_contents(path, message, content, None).await
    }

    #[instrument(skip(self, message, content), fields(bytes = content.len(), revision = %revision))]
    async fn update(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &Revision,
    ) -> Result<(), PublishError> {
        self.put_contents(path, message, content, Some(revision.as_str()))
            .await
    }
}

async fn error_from_response(path: &str, response: Response) -> PublishError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    PublishError::from_status(path, status, message)
}
