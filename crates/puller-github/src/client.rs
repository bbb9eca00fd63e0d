use std::io::Write;
use std::time::Duration;

use puller_core::RepoRef;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cache::ApiCache;
use crate::error::ApiError;
use crate::types::{Branch, CommitInfo, CommitResponse, RepoInfo};

const API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("puller/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Authenticated client for the GitHub REST API.
///
/// Metadata reads go through a 300 s TTL cache; archive downloads are
/// always fresh.
#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: ApiCache,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(API_BASE, token)
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_base_url(base_url: &str, token: Option<String>) -> Self {
        let token = token.filter(|t| !t.is_empty());
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client construction is infallible here");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            cache: ApiCache::new(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub async fn get_repo_info(&self, owner: &str, repo: &str) -> Result<RepoInfo, ApiError> {
        let key = format!("repo:{owner}/{repo}");
        self.cached_get(&key, &format!("/repos/{owner}/{repo}")).await
    }

    pub async fn get_latest_commit(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<CommitInfo, ApiError> {
        let key = format!("commit:{owner}/{repo}:{branch}");
        if let Some(value) = self.cache.get(&key) {
            if let Ok(info) = serde_json::from_value::<CommitInfo>(value) {
                return Ok(info);
            }
        }
        let raw: CommitResponse = self
            .request_json(&format!("/repos/{owner}/{repo}/commits/{branch}"))
            .await?;
        let info = CommitInfo::from(raw);
        if let Ok(value) = serde_json::to_value(&info) {
            self.cache.put(&key, value);
        }
        Ok(info)
    }

    pub async fn get_branches(&self, owner: &str, repo: &str) -> Result<Vec<String>, ApiError> {
        let key = format!("branches:{owner}/{repo}");
        let branches: Vec<Branch> = self
            .cached_get(&key, &format!("/repos/{owner}/{repo}/branches"))
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    /// Download the branch tarball to a temporary file. Never cached.
    pub async fn download_archive(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<NamedTempFile, ApiError> {
        let url = format!("{}/repos/{owner}/{repo}/tarball/{branch}", self.base_url);
        debug!(%url, "downloading archive");

        let mut response = self
            .apply_headers(self.http.get(&url))
            .timeout(ARCHIVE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<serde_json::Value>().await.unwrap_or_default();
            return Err(self.map_error(status.as_u16(), &body, &url));
        }

        let mut file = NamedTempFile::new()?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
        }
        file.flush()?;
        Ok(file)
    }

    /// Parse a repository reference and fetch its metadata; a user-facing
    /// dry run of the configured credentials.
    pub async fn test_connection(&self, repo_url: &str) -> Result<RepoInfo, ApiError> {
        let repo_ref = RepoRef::parse(repo_url)?;
        self.get_repo_info(&repo_ref.owner, &repo_ref.repo).await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn cached_get<T>(&self, key: &str, endpoint: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        if let Some(value) = self.cache.get(key) {
            if let Ok(parsed) = serde_json::from_value::<T>(value) {
                return Ok(parsed);
            }
        }
        let parsed: T = self.request_json(endpoint).await?;
        if let Ok(value) = serde_json::to_value(&parsed) {
            self.cache.put(key, value);
        }
        Ok(parsed)
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(%url, "api request");

        let response = self.apply_headers(self.http.get(&url)).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if status.as_u16() != 200 && status.as_u16() != 201 {
            return Err(self.map_error(status.as_u16(), &body, endpoint));
        }

        serde_json::from_value(body).map_err(|e| ApiError::UnexpectedStatus {
            status: status.as_u16(),
            message: format!("malformed response: {e}"),
        })
    }

    fn apply_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn map_error(&self, status: u16, body: &serde_json::Value, endpoint: &str) -> ApiError {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();

        match status {
            401 => ApiError::AuthenticationFailed(
                "token may be invalid or expired".to_string(),
            ),
            403 if message.to_lowercase().contains("rate limit") => {
                ApiError::RateLimited(message)
            }
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(self.not_found_hint(endpoint)),
            _ => ApiError::UnexpectedStatus { status, message },
        }
    }

    /// 404s against private repos usually mean missing or under-scoped
    /// credentials; say which case applies.
    fn not_found_hint(&self, endpoint: &str) -> String {
        match &self.token {
            None => {
                "repository or branch not found; for private repositories, configure an access token"
                    .to_string()
            }
            Some(token) => {
                let token_kind = if token.starts_with("github_pat_") {
                    "fine-grained"
                } else if token.starts_with("ghp_") {
                    "classic"
                } else {
                    "unknown-format"
                };
                format!(
                    "repository or branch not found at {endpoint}; token is {token_kind}, \
                     ensure it has Contents and Metadata read access for this repository"
                )
            }
        }
    }
}
