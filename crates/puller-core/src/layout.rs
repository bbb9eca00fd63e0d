use std::path::{Path, PathBuf};

use crate::CoreError;

/// On-disk layout of a puller state directory.
#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn activity_file(&self) -> PathBuf {
        self.root.join("activity.json")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join("update.lock")
    }

    pub fn create_dirs(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.snapshots_dir())?;
        std::fs::create_dir_all(self.tmp_dir())?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file().exists()
    }
}
