pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use client::GithubClient;
pub use error::ApiError;
pub use types::{Branch, CommitInfo, RepoInfo};
