use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no repository configured")]
    Unconfigured,
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),
    #[error(transparent)]
    Api(#[from] puller_github::ApiError),
    #[error(transparent)]
    Store(#[from] puller_store::StoreError),
    #[error("failed to extract archive: {0}")]
    ExtractFailed(String),
    #[error("theme path not found in repository: {0}")]
    PathNotFound(String),
    #[error("not a valid theme: {0}")]
    NotATheme(String),
    #[error("failed to copy theme files: {0}")]
    CopyFailed(String),
    #[error(transparent)]
    Core(#[from] puller_core::CoreError),
    #[error(transparent)]
    Crypto(#[from] puller_crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// True when the failure is lock contention with a concurrent run.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SyncError::Store(puller_store::StoreError::LockContention(_))
        )
    }
}
