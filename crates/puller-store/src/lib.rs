pub mod error;
pub mod fsutil;
pub mod lockfile;
pub mod snapshot;

pub use error::StoreError;
pub use lockfile::UpdateLock;
pub use snapshot::{Snapshot, SnapshotStore};
