use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub default_branch: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// Normalized commit data extracted from the branch-tip response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub short_sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// Raw shape of `GET /repos/{owner}/{repo}/commits/{branch}`.
#[derive(Debug, Deserialize)]
pub(crate) struct CommitResponse {
    pub sha: String,
    #[serde(default)]
    pub commit: CommitDetail,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
}

impl From<CommitResponse> for CommitInfo {
    fn from(raw: CommitResponse) -> Self {
        let short_sha = raw.sha.get(..7).unwrap_or(&raw.sha).to_string();
        let (author, date) = raw
            .commit
            .author
            .map(|a| (a.name, a.date))
            .unwrap_or_default();
        CommitInfo {
            sha: raw.sha,
            short_sha,
            message: raw.commit.message,
            author,
            date,
        }
    }
}
