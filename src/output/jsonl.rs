//! JSON Lines writer
//!
//! Each record becomes one compact JSON object terminated by `\n`. Records
//! are written and flushed one at a time, so a run that fails halfway leaves
//! every record written before the failure on disk.

use crate::error::{Error, Result};
use crate::types::Record;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Accepts records one at a time
pub trait RecordSink {
    /// Persist one record
    fn write(&mut self, record: &Record) -> Result<()>;
}

/// Append-mode JSON Lines file
#[derive(Debug)]
pub struct JsonlWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl JsonlWriter {
    /// Open `path` for appending, creating it and its parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::output(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::output(format!("Failed to open {}: {e}", path.display())))?;

        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this writer
    pub fn written(&self) -> usize {
        self.written
    }
}

impl RecordSink for JsonlWriter {
    fn write(&mut self, record: &Record) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        append_line(&mut self.file, &line).map_err(|e| {
            Error::output(format!("Failed to write to {}: {e}", self.path.display()))
        })?;

        self.written += 1;
        Ok(())
    }
}

/// Destination that can cut off a partially written line
trait LineTarget: Write {
    fn end(&mut self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LineTarget for File {
    fn end(&mut self) -> io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Append `line` whole or not at all
fn append_line<T: LineTarget>(target: &mut T, line: &[u8]) -> io::Result<()> {
    let start = target.end()?;
    if let Err(e) = target.write_all(line).and_then(|()| target.flush()) {
        if let Err(undo) = target.truncate_to(start) {
            warn!("Failed to remove partial line: {undo}");
        }
        return Err(e);
    }
    Ok(())
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write(&mut self, record: &Record) -> Result<()> {
        (**self).write(record)
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn write(&mut self, record: &Record) -> Result<()> {
        (**self).write(record)
    }
}

/// Reject user identities that would escape the data directory
pub fn validate_user(user: &str) -> Result<()> {
    let trimmed = user.trim();
    if trimmed.is_empty() {
        return Err(Error::missing_field("user"));
    }
    if trimmed != user
        || user == "."
        || user == ".."
        || user.contains(['/', '\\'])
        || user.chars().any(char::is_control)
    {
        return Err(Error::invalid_value(
            "user",
            format!("'{user}' cannot be used as a file name"),
        ));
    }
    Ok(())
}

/// Output file for a user: `<data_dir>/<user>_opinions.jsonl`
pub fn output_path_for(data_dir: &Path, user: &str) -> Result<PathBuf> {
    validate_user(user)?;
    Ok(data_dir.join(format!("{user}_opinions.jsonl")))
}
