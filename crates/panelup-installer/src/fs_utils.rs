use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Deletes `*.log` files directly inside `logs_dir`. A missing directory is
/// not an error; subdirectories are left alone.
pub fn remove_rotated_logs(logs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !logs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("failed to read log dir: {}", logs_dir.display()))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read log dir entry: {}", logs_dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect log entry: {}", path.display()))?;
        if !file_type.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("log") {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove log file: {}", path.display()))?;
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}
