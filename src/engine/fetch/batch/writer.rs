use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::engine::errors::AggregateFetchError;

use super::info::IndexEntry;

const LOG_TARGET: &str = "chanfetch::batch::writer";

/// Sequential line-based writer for a batch record file. One record per line,
/// UTF-8, no framing beyond the newline.
pub struct BatchWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    offset: u64,
}

impl BatchWriter {
    /// Opens a new record file, creating parent directories as needed.
    pub fn create(path: PathBuf) -> Result<Self, AggregateFetchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        debug!(target: LOG_TARGET, path = %path.display(), "Opened batch record file");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            offset: 0,
        })
    }

    /// Appends one record line and returns the byte offset the line began at.
    pub fn write(&mut self, record: &str) -> Result<u64, AggregateFetchError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AggregateFetchError::Io(io::Error::other("record writer closed")))?;
        let start = self.offset;
        writer.write_all(record.as_bytes())?;
        writer.write_all(b"\n")?;
        self.offset += record.len() as u64 + 1;
        Ok(start)
    }

    /// Flushes and releases the file handle. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), AggregateFetchError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Writer for a batch's companion index file: a stream of bincode-framed
/// [`IndexEntry`] values, one per record line.
pub struct IndexWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl IndexWriter {
    pub fn create(path: PathBuf) -> Result<Self, AggregateFetchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn append(&mut self, entry: &IndexEntry) -> Result<(), AggregateFetchError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AggregateFetchError::Io(io::Error::other("index writer closed")))?;
        bincode::serialize_into(writer, entry)
            .map_err(|e| AggregateFetchError::Io(io::Error::other(e)))?;
        Ok(())
    }

    /// Flushes and releases the file handle. Safe to call more than once.
    pub fn close(&mut self) -> Result<(), AggregateFetchError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
