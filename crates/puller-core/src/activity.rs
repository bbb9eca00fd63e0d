use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Maximum number of entries kept in the activity log.
pub const MAX_ENTRIES: usize = 20;

/// How deep metadata maps may nest. One level of nesting is allowed so a
/// recorder can attach a small structured blob without opening the door to
/// unbounded storage growth.
const MAX_META_DEPTH: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Webhook,
    Manual,
    System,
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogStatus::Success => write!(f, "success"),
            LogStatus::Error => write!(f, "error"),
            LogStatus::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSource::Webhook => write!(f, "webhook"),
            LogSource::Manual => write!(f, "manual"),
            LogSource::System => write!(f, "system"),
        }
    }
}

/// Metadata values are restricted to scalars plus one level of maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Map(BTreeMap<String, MetaValue>),
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        MetaValue::Text(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Int(v)
    }
}

pub type Meta = BTreeMap<String, MetaValue>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// RFC 3339 rendering of `timestamp` for display.
    pub datetime: String,
    pub message: String,
    pub status: LogStatus,
    pub source: LogSource,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
}

/// Append-only, bounded activity log persisted as a JSON file.
///
/// Entries are kept newest-first; recording past the cap evicts the oldest.
#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(Self { path, entries })
    }

    pub fn record(
        &mut self,
        message: &str,
        status: LogStatus,
        source: LogSource,
        meta: Meta,
    ) -> Result<(), CoreError> {
        let now = Utc::now();
        let entry = LogEntry {
            id: format!("log_{:016x}", rand::thread_rng().gen::<u64>()),
            timestamp: now.timestamp(),
            datetime: now.to_rfc3339(),
            message: sanitize_text(message),
            status,
            source,
            meta: sanitize_meta(meta, 0),
        };
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist()
    }

    pub fn record_update_success(
        &mut self,
        short_sha: &str,
        source: LogSource,
        mut meta: Meta,
    ) -> Result<(), CoreError> {
        meta.insert("version".to_string(), short_sha.into());
        self.record(
            &format!("Theme updated successfully to {short_sha}"),
            LogStatus::Success,
            source,
            meta,
        )
    }

    pub fn record_update_error(&mut self, error: &str, source: LogSource) -> Result<(), CoreError> {
        let mut meta = Meta::new();
        meta.insert("error".to_string(), error.into());
        self.record(
            &format!("Theme update failed: {error}"),
            LogStatus::Error,
            source,
            meta,
        )
    }

    pub fn record_snapshot_created(&mut self, name: &str) -> Result<(), CoreError> {
        let mut meta = Meta::new();
        meta.insert("snapshot".to_string(), name.into());
        self.record("Theme snapshot created", LogStatus::Info, LogSource::System, meta)
    }

    pub fn record_restore_success(&mut self, name: &str) -> Result<(), CoreError> {
        let mut meta = Meta::new();
        meta.insert("snapshot".to_string(), name.into());
        self.record(
            &format!("Theme restored from snapshot: {name}"),
            LogStatus::Success,
            LogSource::Manual,
            meta,
        )
    }

    pub fn all(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn recent(&self, n: usize) -> &[LogEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.entries.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Strip control characters from free-text fields.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn sanitize_meta(meta: Meta, depth: usize) -> Meta {
    meta.into_iter()
        .filter_map(|(key, value)| {
            let key = sanitize_key(&key);
            if key.is_empty() {
                return None;
            }
            let value = match value {
                MetaValue::Text(s) => MetaValue::Text(sanitize_text(&s)),
                MetaValue::Map(inner) if depth < MAX_META_DEPTH => {
                    MetaValue::Map(sanitize_meta(inner, depth + 1))
                }
                MetaValue::Map(_) => return None,
                scalar => scalar,
            };
            Some((key, value))
        })
        .collect()
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
