pub mod activity;
pub mod config;
pub mod error;
pub mod layout;
pub mod repo;
pub mod units;

pub use activity::{ActivityLog, LogEntry, LogSource, LogStatus, MetaValue};
pub use config::Config;
pub use error::CoreError;
pub use layout::StateLayout;
pub use repo::RepoRef;
