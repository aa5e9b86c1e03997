//! Shared CSV read/write helpers

use std::path::Path;

use brandlens_core::BrandLensError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BrandLensError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        BrandLensError::io(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.map_err(|e| {
            BrandLensError::csv(format!("Bad row in {}: {}", path.display(), e))
        })?);
    }
    Ok(rows)
}

pub(crate) fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BrandLensError> {
    if let Some(parent) = path.parent() {
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

    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        BrandLensError::io(format!("Failed to write {}: {}", path.display(), e))
    })?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| BrandLensError::csv(format!("Failed to serialize row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| BrandLensError::io(format!("Failed to flush {}: {}", path.display(), e)))?;

    Ok(())
}
