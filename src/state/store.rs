//! Floor store implementations
//!
//! File-backed stores keep the date as raw `YYYY-MM-DD` text and write it
//! atomically (temp file, then rename). A missing or blank file means the
//! user has no floor yet.

use crate::error::{Error, Result};
use crate::output::validate_user;
use crate::types::{format_date, parse_date};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-user watermark storage
#[async_trait]
pub trait FloorStore: Send + Sync {
    /// Stored floor for `user`, `None` when nothing has been synced yet
    async fn load_floor(&self, user: &str) -> Result<Option<NaiveDate>>;

    /// Replace the stored floor for `user`
    async fn save_floor(&self, user: &str, date: NaiveDate) -> Result<()>;

    /// Where the floor for `user` lives, for logs and status output
    fn location(&self, user: &str) -> String;

    /// Whether every user reads and writes the same floor
    fn is_shared(&self) -> bool {
        false
    }
}

// ============================================================================
// Directory of per-user files
// ============================================================================

/// One `<user>.since` file per user inside a directory
#[derive(Debug, Clone)]
pub struct FileFloorStore {
    dir: PathBuf,
}

impl FileFloorStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// State file for `user`
    pub fn path_for(&self, user: &str) -> Result<PathBuf> {
        validate_user(user)?;
        Ok(self.dir.join(format!("{user}.since")))
    }
}

#[async_trait]
impl FloorStore for FileFloorStore {
    async fn load_floor(&self, user: &str) -> Result<Option<NaiveDate>> {
        read_floor_file(&self.path_for(user)?).await
    }

    async fn save_floor(&self, user: &str, date: NaiveDate) -> Result<()> {
        write_floor_file(&self.path_for(user)?, date).await
    }

    fn location(&self, user: &str) -> String {
        self.dir.join(format!("{user}.since")).display().to_string()
    }
}

// ============================================================================
// Single since-file
// ============================================================================

/// A single since-file, whatever the user
#[derive(Debug, Clone)]
pub struct SinceFileStore {
    path: PathBuf,
}

impl SinceFileStore {
    /// Create a store backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the since-file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FloorStore for SinceFileStore {
    async fn load_floor(&self, _user: &str) -> Result<Option<NaiveDate>> {
        read_floor_file(&self.path).await
    }

    async fn save_floor(&self, _user: &str, date: NaiveDate) -> Result<()> {
        write_floor_file(&self.path, date).await
    }

    fn location(&self, _user: &str) -> String {
        self.path.display().to_string()
    }

    fn is_shared(&self) -> bool {
        true
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// In-memory store (no file persistence)
#[derive(Debug, Clone, Default)]
pub struct MemoryFloorStore {
    floors: Arc<RwLock<HashMap<String, NaiveDate>>>,
}

impl MemoryFloorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one floor
    pub fn with_floor(user: impl Into<String>, date: NaiveDate) -> Self {
        let floors = HashMap::from([(user.into(), date)]);
        Self {
            floors: Arc::new(RwLock::new(floors)),
        }
    }
}

#[async_trait]
impl FloorStore for MemoryFloorStore {
    async fn load_floor(&self, user: &str) -> Result<Option<NaiveDate>> {
        Ok(self.floors.read().await.get(user).copied())
    }

    async fn save_floor(&self, user: &str, date: NaiveDate) -> Result<()> {
        self.floors.write().await.insert(user.to_string(), date);
        Ok(())
    }

    fn location(&self, user: &str) -> String {
        format!("memory:{user}")
    }
}

// ============================================================================
// File helpers
// ============================================================================

async fn read_floor_file(path: &Path) -> Result<Option<NaiveDate>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::state(format!(
                "Failed to read state file {}: {e}",
                path.display()
            )))
        }
    };

    let text = contents.trim();
    if text.is_empty() {
        return Ok(None);
    }

    parse_date(text).map(Some).ok_or_else(|| {
        Error::state(format!(
            "State file {} holds '{text}', expected a YYYY-MM-DD date",
            path.display()
        ))
    })
}

async fn write_floor_file(path: &Path, date: NaiveDate) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::state(format!("Failed to create {}: {e}", parent.display())))?;
    }

    // Write to temp file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, format_date(date))
        .await
        .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

    Ok(())
}
