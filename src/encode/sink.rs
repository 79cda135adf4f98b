use std::path::{Path, PathBuf};

use crate::encode::png::ensure_parent_dir;
use crate::foundation::error::TexturaResult;

/// Destination for exported files (a download prompt, a directory, a test buffer).
pub trait ExportSink {
    /// Store `bytes` under `file_name`.
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TexturaResult<()>;
}

/// Writes exports into a directory, replacing files with the same name.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl DirectorySink {
    /// Sink rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    /// Path of the most recent export, if any.
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TexturaResult<()> {
        use anyhow::Context as _;

        let path = self.dir.join(file_name);
        ensure_parent_dir(&path)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write export '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "export written");
        self.last_written = Some(path);
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryExportSink {
    /// Saved `(file_name, bytes)` pairs in save order.
    pub(crate) files: Vec<(String, Vec<u8>)>,
}

impl InMemoryExportSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the saved files.
    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl ExportSink for InMemoryExportSink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> TexturaResult<()> {
        self.files.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
