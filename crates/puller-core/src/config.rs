use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CoreError, StateLayout};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_RETENTION: u32 = 3;
pub const MIN_RETENTION: u32 = 1;
pub const MAX_RETENTION: u32 = 10;

/// Process-wide configuration, persisted as `config.toml` in the state
/// directory. All mutation goes through the settings-save path so dependent
/// caches can be invalidated in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub repository URL or `owner/repo` shorthand.
    pub repo_url: String,
    /// Branch to track.
    pub branch: String,
    /// Optional subpath inside the repository holding the theme.
    pub theme_path: String,
    /// Live theme directory kept in sync.
    pub theme_dir: PathBuf,
    /// Personal access token, encrypted at rest (base64).
    pub token: String,
    /// Key material for token encryption.
    pub encryption_key: String,
    /// Apply pushes from the webhook automatically.
    pub auto_update: bool,
    /// How many snapshots to keep per theme, clamped 1-10.
    pub snapshot_retention: u32,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Commit sha of the last successfully applied update.
    pub last_applied_commit: Option<String>,
    /// Unix timestamp of the last update check.
    pub last_check: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            theme_path: String::new(),
            theme_dir: PathBuf::new(),
            token: String::new(),
            encryption_key: String::new(),
            auto_update: true,
            snapshot_retention: DEFAULT_RETENTION,
            webhook_secret: String::new(),
            last_applied_commit: None,
            last_check: None,
        }
    }
}

impl Config {
    pub fn load(layout: &StateLayout) -> Result<Self, CoreError> {
        let path = layout.config_file();
        if !path.exists() {
            return Err(CoreError::NotInitialized(layout.root().to_path_buf()));
        }
        let content = std::fs::read_to_string(&path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.snapshot_retention = clamp_retention(config.snapshot_retention);
        Ok(config)
    }

    pub fn save(&self, layout: &StateLayout) -> Result<(), CoreError> {
        let mut config = self.clone();
        config.snapshot_retention = clamp_retention(config.snapshot_retention);
        let content = toml::to_string_pretty(&config)?;
        layout.create_dirs()?;
        std::fs::write(layout.config_file(), content)?;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.repo_url.trim().is_empty()
    }

    pub fn theme_slug(&self) -> String {
        self.theme_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "theme".to_string())
    }

    pub fn short_commit(&self) -> Option<&str> {
        self.last_applied_commit
            .as_deref()
            .map(|sha| sha.get(..7).unwrap_or(sha))
    }
}

pub fn clamp_retention(n: u32) -> u32 {
    n.clamp(MIN_RETENTION, MAX_RETENTION)
}
