use std::path::{Path, PathBuf};

use crate::StoreError;

/// Advisory lock around a pipeline run. Created with `create_new` semantics
/// so a second concurrent update fails fast instead of interleaving
/// filesystem writes; removed on drop, including failure paths.
pub struct UpdateLock {
    path: PathBuf,
    _handle: std::fs::File,
}

impl UpdateLock {
    pub fn acquire(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(handle) => Ok(Self {
                path: path.to_path_buf(),
                _handle: handle,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::LockContention(path.to_path_buf()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

impl Drop for UpdateLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
