use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Utc;
use tracing::warn;

use crate::fsutil;
use crate::StoreError;

/// A point-in-time copy of the deployed theme directory.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Directory name, `{slug}_{YYYY-MM-DD_HH-MM-SS}`. This is the identity.
    pub name: String,
    pub path: PathBuf,
    /// Modification time of the snapshot directory.
    pub created_at: SystemTime,
    pub size_bytes: u64,
}

impl Snapshot {
    pub fn size_display(&self) -> String {
        puller_core::units::format_size(self.size_bytes)
    }
}

/// Creates, lists, restores and deletes snapshots under a protected root.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source_dir` into a new timestamped snapshot, then trim old
    /// snapshots for the same slug beyond `retention`.
    pub fn create(
        &self,
        source_dir: &Path,
        slug: &str,
        retention: usize,
    ) -> Result<Snapshot, StoreError> {
        self.ensure_root()?;

        if !source_dir.is_dir() {
            return Err(StoreError::SnapshotFailed(format!(
                "source directory not found: {}",
                source_dir.display()
            )));
        }

        let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
        let mut name = format!("{slug}_{timestamp}");
        // Same-second creations get an ordinal suffix.
        let mut ordinal = 1;
        while self.root.join(&name).exists() {
            ordinal += 1;
            name = format!("{slug}_{timestamp}_{ordinal}");
        }
        let path = self.root.join(&name);

        fsutil::copy_dir_recursive(source_dir, &path)
            .map_err(|e| StoreError::SnapshotFailed(e.to_string()))?;

        self.trim(slug, retention)?;

        let created_at = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());
        Ok(Snapshot {
            size_bytes: fsutil::dir_size(&path),
            name,
            path,
            created_at,
        })
    }

    /// List snapshots, newest first. `slug` filters by `{slug}_` prefix.
    pub fn list(&self, slug: Option<&str>) -> Result<Vec<Snapshot>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(slug) = slug {
                if !name.starts_with(&format!("{slug}_")) {
                    continue;
                }
            }
            let path = entry.path();
            let created_at = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            snapshots.push(Snapshot {
                size_bytes: fsutil::dir_size(&path),
                name,
                path,
                created_at,
            });
        }

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.name.cmp(&a.name)));
        Ok(snapshots)
    }

    /// Replace the contents of `target_dir` with the named snapshot.
    pub fn restore(&self, name: &str, target_dir: &Path) -> Result<(), StoreError> {
        let path = self.resolve(name)?;

        fsutil::remove_dir_contents(target_dir)
            .map_err(|e| StoreError::DeleteFailed(e.to_string()))?;
        fsutil::copy_dir_recursive(&path, target_dir)
            .map_err(|e| StoreError::RestoreFailed(e.to_string()))?;
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.resolve(name)?;
        std::fs::remove_dir_all(&path).map_err(|e| StoreError::DeleteFailed(e.to_string()))
    }

    fn trim(&self, slug: &str, retention: usize) -> Result<(), StoreError> {
        let retention = retention.max(1);
        let snapshots = self.list(Some(slug))?;
        for stale in snapshots.iter().skip(retention) {
            if let Err(e) = std::fs::remove_dir_all(&stale.path) {
                warn!(snapshot = %stale.name, error = %e, "failed to trim old snapshot");
            }
        }
        Ok(())
    }

    /// Resolve a snapshot name to its directory, rejecting anything that
    /// could escape the snapshot root.
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        let path = self.root.join(name);
        if !path.is_dir() {
            return Err(StoreError::SnapshotNotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Create the root with deny-all and index sentinels on first use.
    fn ensure_root(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;

        let htaccess = self.root.join(".htaccess");
        if !htaccess.exists() {
            std::fs::write(htaccess, "Deny from all\n")?;
        }
        let index = self.root.join("index.html");
        if !index.exists() {
            std::fs::write(index, "")?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
