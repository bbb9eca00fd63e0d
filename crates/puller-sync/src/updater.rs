use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use puller_core::activity::{ActivityLog, LogSource, LogStatus, Meta};
use puller_core::{Config, RepoRef, StateLayout};
use puller_github::{CommitInfo, GithubClient, RepoInfo};
use puller_store::{Snapshot, SnapshotStore, UpdateLock};
use tracing::{info, warn};

use crate::{archive, theme, SyncError};

/// Orchestrates the update pipeline over explicitly constructed
/// collaborators: the GitHub client, the snapshot store and the activity
/// log. Built once at process start and shared by the CLI and the webhook
/// gateway.
pub struct Updater {
    layout: StateLayout,
    client: GithubClient,
    snapshots: SnapshotStore,
    config: Mutex<Config>,
    log: Mutex<ActivityLog>,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub commit: CommitInfo,
    pub snapshot: Option<Snapshot>,
    pub theme_name: String,
}

#[derive(Debug)]
pub struct CheckOutcome {
    pub update_available: bool,
    pub current_commit: Option<String>,
    pub latest_commit: CommitInfo,
    pub is_first_install: bool,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub is_configured: bool,
    pub repo: Option<RepoRef>,
    pub branch: String,
    pub theme_path: String,
    pub theme_dir: PathBuf,
    pub current_commit: Option<String>,
    pub short_commit: Option<String>,
    pub last_check: Option<i64>,
    pub auto_update: bool,
    pub webhook_configured: bool,
}

/// Fields a settings save may change. `None` leaves a field untouched;
/// `token: Some("")` clears the stored token.
#[derive(Debug, Default)]
pub struct SettingsPatch {
    pub repo_url: Option<String>,
    pub branch: Option<String>,
    pub theme_path: Option<String>,
    pub theme_dir: Option<PathBuf>,
    pub token: Option<String>,
    pub auto_update: Option<bool>,
    pub snapshot_retention: Option<u32>,
}

impl Updater {
    /// Load state from `layout` and wire up the collaborators.
    pub fn open(layout: StateLayout) -> Result<Self, SyncError> {
        let config = Config::load(&layout)?;
        let token = puller_crypto::token::decrypt_token(&config.encryption_key, &config.token)?;
        let client = GithubClient::new((!token.is_empty()).then_some(token));
        Self::with_client(layout, config, client)
    }

    /// As `open`, but with a caller-supplied client. Used by tests to point
    /// at a mock API host.
    pub fn with_client(
        layout: StateLayout,
        config: Config,
        client: GithubClient,
    ) -> Result<Self, SyncError> {
        let snapshots = SnapshotStore::new(layout.snapshots_dir());
        let log = ActivityLog::open(layout.activity_file())?;
        Ok(Self {
            layout,
            client,
            snapshots,
            config: Mutex::new(config),
            log: Mutex::new(log),
        })
    }

    pub fn config(&self) -> Config {
        self.config.lock().expect("config lock poisoned").clone()
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Run the full update pipeline. Every outcome is recorded in the
    /// activity log before this returns.
    pub async fn update(&self, source: LogSource) -> Result<UpdateOutcome, SyncError> {
        let result = self.run_pipeline(source).await;
        match &result {
            Ok(outcome) => {
                let mut meta = Meta::new();
                meta.insert("commit_sha".to_string(), outcome.commit.sha.clone().into());
                meta.insert(
                    "commit_message".to_string(),
                    truncate(&outcome.commit.message, 100).into(),
                );
                self.record(|log| {
                    log.record_update_success(&outcome.commit.short_sha, source, meta)
                });
            }
            Err(err) => {
                let message = err.to_string();
                self.record(|log| log.record_update_error(&message, source));
            }
        }
        result
    }

    async fn run_pipeline(&self, source: LogSource) -> Result<UpdateOutcome, SyncError> {
        // One orchestrator run at a time; a concurrent caller fails fast.
        let _lock = UpdateLock::acquire(&self.layout.lock_file())?;

        let config = self.config();
        let repo = validate_repo(&config)?;
        info!(repo = %repo, branch = %config.branch, %source, "starting update");

        let commit = self
            .client
            .get_latest_commit(&repo.owner, &repo.repo, &config.branch)
            .await?;

        // Snapshot the live theme before touching it. A first install has
        // nothing to snapshot yet.
        let snapshot = if config.theme_dir.is_dir() {
            let snap = self.snapshots.create(
                &config.theme_dir,
                &config.theme_slug(),
                config.snapshot_retention as usize,
            )?;
            self.record(|log| log.record_snapshot_created(&snap.name));
            Some(snap)
        } else {
            info!("theme directory absent, skipping snapshot (first install)");
            None
        };

        let archive_file = self
            .client
            .download_archive(&repo.owner, &repo.repo, &config.branch)
            .await?;

        let extract_dir = tempfile::Builder::new()
            .prefix("puller-")
            .tempdir_in(self.layout.tmp_dir())?;

        let archive_path = archive_file.path().to_path_buf();
        let extract_path = extract_dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || archive::extract_tarball(&archive_path, &extract_path))
            .await
            .map_err(|e| SyncError::Internal(e.to_string()))??;

        let mut candidate_root = archive::archive_root(extract_dir.path())?;
        if !config.theme_path.is_empty() {
            candidate_root = candidate_root.join(&config.theme_path);
            if !candidate_root.is_dir() {
                return Err(SyncError::PathNotFound(config.theme_path.clone()));
            }
        }

        let theme_name = theme::validate_theme_root(&candidate_root)?;

        let source_root = candidate_root.clone();
        let theme_dir = config.theme_dir.clone();
        tokio::task::spawn_blocking(move || replace_live_files(&source_root, &theme_dir))
            .await
            .map_err(|e| SyncError::Internal(e.to_string()))??;

        // Best-effort cache clear; never fails the pipeline. The temp
        // archive and extraction dir are cleaned up on drop.
        self.client.clear_cache();

        {
            let mut config = self.config.lock().expect("config lock poisoned");
            config.last_applied_commit = Some(commit.sha.clone());
            config.last_check = Some(Utc::now().timestamp());
            config.save(&self.layout)?;
        }

        info!(sha = %commit.short_sha, theme = %theme_name, "update applied");
        Ok(UpdateOutcome {
            commit,
            snapshot,
            theme_name,
        })
    }

    /// Read-only variant of the pipeline: compares commit identifiers and
    /// never touches the theme or `last_applied_commit`.
    pub async fn check_for_updates(&self) -> Result<CheckOutcome, SyncError> {
        let config = self.config();
        let repo = validate_repo(&config)?;

        // Force freshness; a poll that hits the cache cannot see new pushes.
        self.client.clear_cache();
        let latest = self
            .client
            .get_latest_commit(&repo.owner, &repo.repo, &config.branch)
            .await?;

        {
            let mut config = self.config.lock().expect("config lock poisoned");
            config.last_check = Some(Utc::now().timestamp());
            config.save(&self.layout)?;
        }

        let current = config.last_applied_commit.clone();
        Ok(CheckOutcome {
            update_available: current.as_deref().is_some_and(|sha| sha != latest.sha),
            is_first_install: current.is_none(),
            current_commit: current,
            latest_commit: latest,
        })
    }

    /// Dry run of the configured reference and credentials.
    pub async fn test_connection(&self, repo_url: &str) -> Result<RepoInfo, SyncError> {
        Ok(self.client.test_connection(repo_url).await?)
    }

    pub async fn list_branches(&self, repo: &RepoRef) -> Result<Vec<String>, SyncError> {
        Ok(self.client.get_branches(&repo.owner, &repo.repo).await?)
    }

    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>, SyncError> {
        let slug = self.config().theme_slug();
        Ok(self.snapshots.list(Some(&slug))?)
    }

    pub fn restore_snapshot(&self, name: &str) -> Result<(), SyncError> {
        let theme_dir = self.config().theme_dir;
        match self.snapshots.restore(name, &theme_dir) {
            Ok(()) => {
                self.record(|log| log.record_restore_success(name));
                Ok(())
            }
            Err(err) => {
                let message = format!("Theme restore failed: {err}");
                self.record(|log| {
                    log.record(&message, LogStatus::Error, LogSource::Manual, Meta::new())
                });
                Err(err.into())
            }
        }
    }

    pub fn delete_snapshot(&self, name: &str) -> Result<(), SyncError> {
        match self.snapshots.delete(name) {
            Ok(()) => {
                let message = format!("Snapshot deleted: {name}");
                self.record(|log| {
                    log.record(&message, LogStatus::Info, LogSource::Manual, Meta::new())
                });
                Ok(())
            }
            Err(err) => {
                let message = format!("Snapshot delete failed: {err}");
                self.record(|log| {
                    log.record(&message, LogStatus::Error, LogSource::Manual, Meta::new())
                });
                Err(err.into())
            }
        }
    }

    /// Apply a settings save. The single write path: persists the config and
    /// invalidates the API response cache so stale credentials or repo
    /// identity cannot serve another poll cycle.
    pub fn apply_settings(&self, patch: SettingsPatch) -> Result<Config, SyncError> {
        let updated = {
            let mut config = self.config.lock().expect("config lock poisoned");
            if let Some(repo_url) = patch.repo_url {
                config.repo_url = repo_url;
            }
            if let Some(branch) = patch.branch {
                config.branch = branch;
            }
            if let Some(theme_path) = patch.theme_path {
                config.theme_path = theme_path;
            }
            if let Some(theme_dir) = patch.theme_dir {
                config.theme_dir = theme_dir;
            }
            if let Some(auto_update) = patch.auto_update {
                config.auto_update = auto_update;
            }
            if let Some(retention) = patch.snapshot_retention {
                config.snapshot_retention = puller_core::config::clamp_retention(retention);
            }
            if let Some(token) = patch.token {
                if config.encryption_key.is_empty() {
                    config.encryption_key = puller_crypto::webhook::generate_secret();
                }
                config.token =
                    puller_crypto::token::encrypt_token(&config.encryption_key, &token)?;
            }
            config.save(&self.layout)?;
            config.clone()
        };
        self.client.clear_cache();
        Ok(updated)
    }

    /// Rotate the webhook secret and return the new value.
    pub fn regenerate_secret(&self) -> Result<String, SyncError> {
        let secret = puller_crypto::webhook::generate_secret();
        {
            let mut config = self.config.lock().expect("config lock poisoned");
            config.webhook_secret = secret.clone();
            config.save(&self.layout)?;
        }
        self.record(|log| {
            log.record(
                "Webhook secret regenerated",
                LogStatus::Info,
                LogSource::Manual,
                Meta::new(),
            )
        });
        Ok(secret)
    }

    pub fn status(&self) -> StatusReport {
        let config = self.config();
        let repo = RepoRef::parse(&config.repo_url).ok();
        StatusReport {
            is_configured: config.is_configured() && repo.is_some(),
            repo,
            branch: config.branch.clone(),
            theme_path: config.theme_path.clone(),
            theme_dir: config.theme_dir.clone(),
            short_commit: config.short_commit().map(str::to_string),
            current_commit: config.last_applied_commit.clone(),
            last_check: config.last_check,
            auto_update: config.auto_update,
            webhook_configured: !config.webhook_secret.is_empty(),
        }
    }

    pub fn recent_log(&self, n: usize) -> Vec<puller_core::LogEntry> {
        self.log
            .lock()
            .expect("log lock poisoned")
            .recent(n)
            .to_vec()
    }

    pub fn clear_log(&self) -> Result<(), SyncError> {
        self.log.lock().expect("log lock poisoned").clear()?;
        Ok(())
    }

    /// Record an activity-log entry, keeping the caller's error intact if
    /// persistence itself fails.
    pub(crate) fn record<F>(&self, f: F)
    where
        F: FnOnce(&mut ActivityLog) -> Result<(), puller_core::CoreError>,
    {
        let mut log = self.log.lock().expect("log lock poisoned");
        if let Err(e) = f(&mut log) {
            warn!(error = %e, "failed to persist activity log entry");
        }
    }
}

fn validate_repo(config: &Config) -> Result<RepoRef, SyncError> {
    if !config.is_configured() {
        return Err(SyncError::Unconfigured);
    }
    RepoRef::parse(&config.repo_url)
        .map_err(|_| SyncError::InvalidReference(config.repo_url.clone()))
}

/// Step 8: delete the live directory's contents, then copy the candidate
/// root in. Not atomic; the pre-update snapshot is the recovery path.
fn replace_live_files(
    source_root: &std::path::Path,
    theme_dir: &std::path::Path,
) -> Result<(), SyncError> {
    std::fs::create_dir_all(theme_dir).map_err(|e| SyncError::CopyFailed(e.to_string()))?;
    puller_store::fsutil::remove_dir_contents(theme_dir)
        .map_err(|e| SyncError::CopyFailed(e.to_string()))?;
    puller_store::fsutil::copy_dir_recursive(source_root, theme_dir)
        .map_err(|e| SyncError::CopyFailed(e.to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
