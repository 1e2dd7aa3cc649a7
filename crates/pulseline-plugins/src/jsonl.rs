//! JSON-lines source and sink collaborators.
//!
//! One JSON message per line. A finite, pull-style pair good enough
//! for batch runs and fixtures; network sources register under the
//! same seams.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use pulseline_engine::sink::Sink;
use pulseline_engine::source::{SelectionRange, Source};
use pulseline_engine::stream::{from_iter, EntityStream};
use pulseline_types::entity::Message;

/// Reads messages from a JSON-lines file, filtered by the selection
/// range. Malformed lines are logged and skipped — one bad record must
/// not abort a historical import.
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source<Message> for JsonlSource {
    fn open(&self, range: &SelectionRange) -> anyhow::Result<EntityStream<Message>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open source file: {}", self.path.display()))?;
        let reader = BufReader::new(file);

        let mut messages = Vec::new();
        let mut skipped = 0usize;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(&line) {
                Ok(message) => {
                    if range.contains(message.date) {
                        messages.push(message);
                    }
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        line = line_no + 1,
                        error = %err,
                        "skipping malformed message line"
                    );
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, path = %self.path.display(), "source skipped malformed lines");
        }
        tracing::info!(
            count = messages.len(),
            path = %self.path.display(),
            "source opened"
        );
        Ok(from_iter(messages))
    }
}

/// Appends messages to a JSON-lines file, one per line per batch item.
pub struct JsonlSink {
    file: Mutex<File>,
    path: PathBuf,
}

impl JsonlSink {
    /// Open (or create) the sink file for appending.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open sink file: {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Sink<Message> for JsonlSink {
    fn persist(&self, batch: &[Message]) -> anyhow::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        for message in batch {
            let line = serde_json::to_string(message)?;
            writeln!(file, "{line}")?;
        }
        file.flush()?;
        Ok(())
    }
}
