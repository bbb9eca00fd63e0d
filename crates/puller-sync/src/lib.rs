pub mod archive;
pub mod error;
pub mod theme;
pub mod updater;
pub mod webhook;

pub use error::SyncError;
pub use updater::{CheckOutcome, SettingsPatch, StatusReport, UpdateOutcome, Updater};
