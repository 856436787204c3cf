//! Persistence for the control switch and the article database.
//!
//! Both records are JSON files shared with the operator's control panel.
//! Snapshot writes go to a sibling temp file which is fsynced and then renamed
//! over the target, so readers see either the old or the new record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::item::Item;
use crate::rss::parse_date;
use crate::TARGET_DB;

/// The operator's run/pause switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub is_running: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub summary: String,
    pub published_at: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StoredArticle {
    pub fn from_item(item: Item, score: u8) -> Self {
        StoredArticle {
            title: item.title,
            link: item.link,
            summary: item.summary,
            published_at: item.published_at.to_rfc3339(),
            score,
            source: Some(item.source),
        }
    }
}

/// Full database record: the incremental cutoff plus every persisted article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub last_fetch_time: Option<String>,
    #[serde(default)]
    pub articles: Vec<StoredArticle>,
}

impl Snapshot {
    /// The stored cutoff, if present and parseable.
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch_time.as_deref().and_then(parse_date)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_run_state(&self) -> Result<RunState, StoreError>;
    async fn save_run_state(&self, state: RunState) -> Result<(), StoreError>;
    async fn load_snapshot(&self) -> Result<Snapshot, StoreError>;
    /// Replace the snapshot atomically.
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    status_path: PathBuf,
    database_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(status_path: impl Into<PathBuf>, database_path: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            status_path: status_path.into(),
            database_path: database_path.into(),
        }
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

#[async_trait]
impl Store for JsonFileStore {
    /// The switch belongs to the operator: it is created when absent but an
    /// undecodable record is reported, never rewritten.
    async fn load_run_state(&self) -> Result<RunState, StoreError> {
        read_json_or_default(&self.status_path, OnCorrupt::Fail).await
    }

    async fn save_run_state(&self, state: RunState) -> Result<(), StoreError> {
        write_json_atomic(&self.status_path, &state).await
    }

    async fn load_snapshot(&self) -> Result<Snapshot, StoreError> {
        read_json_or_default(&self.database_path, OnCorrupt::Reset).await
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        write_json_atomic(&self.database_path, snapshot).await?;
        debug!(target: TARGET_DB, "Wrote {} articles to {}", snapshot.articles.len(), self.database_path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnCorrupt {
    /// Overwrite the record with defaults.
    Reset,
    /// Leave the file alone and return [`StoreError::Unavailable`].
    Fail,
}

/// Read a JSON record, creating it with defaults when absent.
async fn read_json_or_default<T>(path: &Path, on_corrupt: OnCorrupt) -> Result<T, StoreError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(target: TARGET_DB, "{} not found, creating with defaults", path.display());
            let value = T::default();
            write_json_atomic(path, &value).await?;
            return Ok(value);
        }
        Err(err) => return Err(StoreError::io(path, err)),
    };

    match serde_json::from_slice(&raw) {
        Ok(value) => Ok(value),
        Err(err) if on_corrupt == OnCorrupt::Fail => Err(StoreError::Unavailable(format!(
            "{} is not a valid record: {}",
            path.display(),
            err
        ))),
        Err(err) => {
            warn!(target: TARGET_DB, "{} is corrupt ({}), resetting to defaults", path.display(), err);
            let value = T::default();
            write_json_atomic(path, &value).await?;
            Ok(value)
        }
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;
    let tmp_path = temp_path_for(path);

    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.write_all(&body)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    drop(file);

    if let Err(err) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(StoreError::io(path, err));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
