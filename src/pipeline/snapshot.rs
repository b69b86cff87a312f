//! Latest-state JSON snapshots on the file system.
//!
//! Each pipeline run writes one OCR snapshot and one extraction snapshot per
//! document id, overwriting the previous run's files — only the latest run is
//! retained on disk even though the database keeps full version history.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

/// Write `{dir}/{document_id}.json`, creating the directory when needed.
pub fn write_snapshot<T: Serialize>(
    dir: &Path,
    document_id: &Uuid,
    payload: &T,
) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, document_id);
    let json = serde_json::to_string_pretty(payload)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

pub fn snapshot_path(dir: &Path, document_id: &Uuid) -> PathBuf {
    dir.join(format!("{document_id}.json"))
}
