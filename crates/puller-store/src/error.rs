use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),
    #[error("invalid snapshot name: {0}")]
    InvalidName(String),
    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("restore failed: {0}")]
    RestoreFailed(String),
    #[error("another update is already running (lock held at {0})")]
    LockContention(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
