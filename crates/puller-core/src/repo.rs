use crate::CoreError;

/// A parsed `{owner, repo}` repository identity.
///
/// Derived from the configured URL on every use, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse a repository reference.
    ///
    /// Accepted forms:
    /// - `owner/repo`
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo.git`
    /// - `git@github.com:owner/repo.git`
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CoreError::InvalidReference("empty input".to_string()));
        }

        if let Some(r) = parse_bare(input) {
            return Ok(r);
        }

        if let Some(pos) = input.find("github.com") {
            let rest = &input["github.com".len() + pos..];
            if let Some(stripped) = rest.strip_prefix('/').or_else(|| rest.strip_prefix(':')) {
                if let Some(r) = parse_path(stripped) {
                    return Ok(r);
                }
            }
        }

        Err(CoreError::InvalidReference(input.to_string()))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn is_owner_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_repo_char(c: char) -> bool {
    is_owner_char(c) || c == '.'
}

fn strip_git_suffix(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

/// `owner/repo` with nothing else.
fn parse_bare(input: &str) -> Option<RepoRef> {
    let (owner, repo) = input.split_once('/')?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    if !owner.chars().all(is_owner_char) || !repo.chars().all(is_repo_char) {
        return None;
    }
    let repo = strip_git_suffix(repo);
    if repo.is_empty() {
        return None;
    }
    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// `owner/repo[...]` at the start of a URL path; trailing path segments,
/// query strings and fragments are ignored.
fn parse_path(rest: &str) -> Option<RepoRef> {
    let mut parts = rest.splitn(3, '/');
    let owner: String = parts.next()?.chars().take_while(|c| is_owner_char(*c)).collect();
    let repo_raw: String = parts.next()?.chars().take_while(|c| is_repo_char(*c)).collect();
    if owner.is_empty() || repo_raw.is_empty() {
        return None;
    }
    // The owner segment must be exactly the chars we accepted.
    if rest.split('/').next() != Some(owner.as_str()) {
        return None;
    }
    let repo = strip_git_suffix(&repo_raw);
    if repo.is_empty() {
        return None;
    }
    Some(RepoRef {
        owner,
        repo: repo.to_string(),
    })
}
