//! Filesystem helpers for clip directories and scratch cleanup.

use std::path::{Path, PathBuf};
use chrono::Local;

use crate::error::MediaResult;

/// Name a clip directory: `YYYYmmdd-HHMMSS-NN`.
///
/// The timestamp is shared by every clip of a job; the suffix is the
/// 1-based clip index.
pub fn clip_dir_name(job_started: &chrono::DateTime<Local>, clip_index: usize) -> String {
    format!("{}-{:02}", job_started.format("%Y%m%d-%H%M%S"), clip_index)
}

/// Create the directory for one clip under the output root.
pub async fn create_clip_dir(
    output_root: &Path,
    job_started: &chrono::DateTime<Local>,
    clip_index: usize,
) -> MediaResult<PathBuf> {
    let dir = output_root.join(clip_dir_name(job_started, clip_index));
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Remove intermediate files, ignoring ones already gone.
pub async fn remove_intermediates(paths: &[PathBuf]) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}

/// Recursively delete a job's scratch directory.
pub async fn clear_scratch_dir(dir: &Path) -> MediaResult<()> {
    if dir.exists() {
        tokio::fs::remove_dir_all(dir).await?;
    }
    Ok(())
}
