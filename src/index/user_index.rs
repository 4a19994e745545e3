//! User index persistence

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Summary of one user's syncs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIndexEntry {
    /// Records written by the last run
    pub count: usize,
    /// Records written across all runs
    #[serde(default)]
    pub total_records: u64,
    /// Completed runs
    #[serde(default)]
    pub runs: u64,
    /// Output file of the last run
    pub last_output: String,
    /// When the last run finished
    pub last_run: DateTime<Utc>,
    /// Every output file written for this user
    #[serde(default)]
    pub saved_files: Vec<String>,
}

/// On-disk layout of the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFile {
    #[serde(default)]
    pub users: BTreeMap<String, UserIndexEntry>,
}

/// JSON index of users and their runs
#[derive(Debug, Clone)]
pub struct UserIndex {
    path: PathBuf,
}

impl UserIndex {
    /// Create an index backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole index; a missing file is an empty index
    pub async fn load(&self) -> Result<IndexFile> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(IndexFile::default()),
            Err(e) => {
                return Err(Error::index(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        if contents.trim().is_empty() {
            return Ok(IndexFile::default());
        }

        serde_json::from_str(&contents)
            .map_err(|e| Error::index(format!("Failed to parse {}: {e}", self.path.display())))
    }

    /// Entry for one user
    pub async fn get(&self, user: &str) -> Result<Option<UserIndexEntry>> {
        Ok(self.load().await?.users.remove(user))
    }

    /// Upsert the entry for `user` after a completed run
    pub async fn record_run(
        &self,
        user: &str,
        count: usize,
        output_path: &Path,
        timestamp: DateTime<Utc>,
    ) -> Result<UserIndexEntry> {
        let mut index = self.load().await?;
        let output = output_path.display().to_string();

        let entry = index
            .users
            .entry(user.to_string())
            .and_modify(|entry| {
                entry.count = count;
                entry.total_records += count as u64;
                entry.runs += 1;
                entry.last_output.clone_from(&output);
                entry.last_run = timestamp;
            })
            .or_insert_with(|| UserIndexEntry {
                count,
                total_records: count as u64,
                runs: 1,
                last_output: output.clone(),
                last_run: timestamp,
                saved_files: Vec::new(),
            });

        if !entry.saved_files.contains(&output) {
            entry.saved_files.push(output);
        }
        let updated = entry.clone();

        self.save(&index).await?;
        Ok(updated)
    }

    async fn save(&self, index: &IndexFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::index(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let contents = serde_json::to_string_pretty(index)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents)
            .await
            .map_err(|e| Error::index(format!("Failed to write index: {e}")))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::index(format!("Failed to rename index: {e}")))?;

        Ok(())
    }
}
