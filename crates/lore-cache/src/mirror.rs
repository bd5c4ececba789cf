use crate::manager::CacheEntry;
use lore_core::{LoreError, LoreResult};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Durable JSONL mirror for cache entries.
///
/// Appends one line per stored entry and rewrites the file wholesale after
/// evictions or clears. Callers treat every failure as non-fatal; the
/// manager logs and proceeds uncached.
pub struct FileCacheMirror {
    path: PathBuf,
}

impl FileCacheMirror {
    /// Create a mirror at the given path, creating parent directories.
    pub fn new(path: PathBuf) -> LoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Load all entries from disk. Unparseable lines are skipped with a
    /// warning rather than failing the whole reload.
    pub fn load(&self) -> LoreResult<Vec<CacheEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for line in data.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CacheEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(error = %e, "skipping malformed cache mirror line"),
            }
        }
        Ok(entries)
    }

    /// Append one entry.
    pub fn append(&self, entry: &CacheEntry) -> LoreResult<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LoreError::Cache(format!("open mirror: {e}")))?;
        file.write_all(line.as_bytes())
            .map_err(|e| LoreError::Cache(format!("append mirror: {e}")))?;
        Ok(())
    }

    /// Rewrite the whole file from the given entries.
    pub fn rewrite<'a>(&self, entries: impl Iterator<Item = &'a CacheEntry>) -> LoreResult<()> {
        let mut data = String::new();
        for entry in entries {
            data.push_str(&serde_json::to_string(entry)?);
            data.push('\n');
        }
        std::fs::write(&self.path, data.as_bytes())
            .map_err(|e| LoreError::Cache(format!("rewrite mirror: {e}")))?;
        Ok(())
    }
}
