//! Checkpoint store - resume support for collection runs
//!
//! The output CSV doubles as the checkpoint: it is reloaded at startup to
//! skip completed queries and fully rewritten after every processed query.
//! Full rewrite keeps the row shape intact no matter when the process dies;
//! the write goes through a sibling temp file renamed into place so a crash
//! mid-flush can never truncate rows that were already complete.

use std::path::{Path, PathBuf};

use brandlens_core::{BrandLensError, ResponseRecord};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Completed responses keyed by query id, in first-completion order
pub type CheckpointSet = IndexMap<String, ResponseRecord>;

/// Manages checkpoint persistence (load/save)
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store for the given output file. No I/O happens here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load previously completed responses. A missing file is an empty set,
    /// not an error - first runs start from nothing.
    pub fn load(&self) -> Result<CheckpointSet, BrandLensError> {
        if !self.path.exists() {
            debug!("No checkpoint at {}, starting fresh", self.path.display());
            return Ok(CheckpointSet::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            BrandLensError::io(format!(
                "Failed to read checkpoint {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut records = CheckpointSet::new();
        for row in reader.deserialize() {
            let record: ResponseRecord = row.map_err(|e| {
                BrandLensError::csv(format!(
                    "Bad row in checkpoint {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            records.insert(record.query_id.clone(), record);
        }

        info!(
            "Resumed checkpoint: {} completed queries in {}",
            records.len(),
            self.path.display()
        );

        Ok(records)
    }

    /// Rewrite the whole file (header + all rows) through a temp file.
    pub fn save(&self, records: &CheckpointSet) -> Result<(), BrandLensError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BrandLensError::io(format!(
                        "Failed to create output dir {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let tmp = self.tmp_path();

        // Header written by hand so even an empty set produces a well-formed
        // file; serde's automatic header only appears with the first row.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)
            .map_err(|e| BrandLensError::io(format!("Failed to write {}: {}", tmp.display(), e)))?;

        writer
            .write_record(["query_id", "query_text", "topic", "response_text"])
            .map_err(|e| BrandLensError::csv(format!("Failed to write header: {}", e)))?;

        for record in records.values() {
            writer.serialize(record).map_err(|e| {
                BrandLensError::csv(format!("Failed to serialize row: {}", e))
            })?;
        }

        writer
            .flush()
            .map_err(|e| BrandLensError::io(format!("Failed to flush {}: {}", tmp.display(), e)))?;
        drop(writer);

        std::fs::rename(&tmp, &self.path).map_err(|e| {
            BrandLensError::io(format!(
                "Failed to move checkpoint into place at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Checkpoint saved: {} rows", records.len());

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "checkpoint".to_string());
        self.path.with_file_name(format!("{}.tmp", file_name))
    }
}
