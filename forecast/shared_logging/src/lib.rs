#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Structured JSON-lines logging shared by the forecast crates.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Log severity level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational events.
    Info,
    /// Warning indicator.
    Warn,
    /// Error indicator.
    Error,
}

/// Structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp in ISO8601.
    pub timestamp: DateTime<Utc>,
    /// Module emitting the log.
    pub module: String,
    /// Severity.
    pub level: LogLevel,
    /// Dotted message key, e.g. `estimate.completed`.
    pub message: String,
    /// Structured fields attached to the record.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a record with the provided info.
    #[must_use]
    pub fn new(module: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            level,
            message: message.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attaches structured metadata. Non-object values are ignored.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = metadata {
            self.metadata = map;
        }
        self
    }
}

#[derive(Debug)]
enum Sink {
    File { path: PathBuf, file: File },
    Memory(Vec<String>),
}

/// Thread-safe JSON logger with append-only semantics.
#[derive(Debug)]
pub struct JsonLogger {
    min_level: LogLevel,
    sink: Mutex<Sink>,
}

impl JsonLogger {
    /// Creates or opens a file-backed logger at the desired path.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            min_level: LogLevel::Debug,
            sink: Mutex::new(Sink::File { path, file }),
        })
    }

    /// Creates a logger that keeps lines in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            min_level: LogLevel::Debug,
            sink: Mutex::new(Sink::Memory(Vec::new())),
        }
    }

    /// Drops records below `level`.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Writes a log record as a JSON line.
    ///
    /// # Errors
    ///
    /// Fails on serialization or sink write errors.
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        if record.level < self.min_level {
            return Ok(());
        }
        let line = serde_json::to_string(record)?;
        match &mut *self.sink.lock() {
            Sink::File { file, .. } => {
                file.write_all(line.as_bytes())?;
                file.write_all(b"\n")?;
                file.flush()?;
            }
            Sink::Memory(lines) => lines.push(line),
        }
        Ok(())
    }

    /// Returns the backing file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        match &*self.sink.lock() {
            Sink::File { path, .. } => Some(path.clone()),
            Sink::Memory(_) => None,
        }
    }

    /// Lines captured by an in-memory logger. Empty for file sinks.
    #[must_use]
    pub fn captured(&self) -> Vec<String> {
        match &*self.sink.lock() {
            Sink::Memory(lines) => lines.clone(),
            Sink::File { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_json_lines() {
        let dir = tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("nested/estimate.log")).unwrap();
        logger
            .log(&LogRecord::new("engine", LogLevel::Info, "estimate.completed"))
            .unwrap();
        let content = fs::read_to_string(logger.path().unwrap()).unwrap();
        assert!(content.contains("\"message\":\"estimate.completed\""));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn memory_sink_filters_by_level() {
        let logger = JsonLogger::in_memory().with_min_level(LogLevel::Warn);
        logger
            .log(&LogRecord::new("engine", LogLevel::Info, "skipped"))
            .unwrap();
        logger
            .log(
                &LogRecord::new("engine", LogLevel::Error, "kept")
                    .with_metadata(serde_json::json!({ "samples": 10 })),
            )
            .unwrap();
        let lines = logger.captured();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"samples\":10"));
        assert!(logger.path().is_none());
    }
}
