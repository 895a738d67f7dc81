//! Project snapshot persistence.
//!
//! After a successful export the aggregate is written to disk so later
//! runs can skip retrieval and normalization entirely. One snapshot per
//! source project, written atomically (temp file + rename) so a crash
//! mid-write never leaves a half-written snapshot behind.

use crate::error::Result;
use crate::model::Project;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Snapshot file for a project inside the state directory.
#[must_use]
pub fn snapshot_path(state_dir: &Path, project: &str) -> PathBuf {
    state_dir.join(format!("{project}.json"))
}

/// Persist the aggregate, replacing any previous snapshot.
///
/// # Errors
///
/// Returns an error if the state directory cannot be created or the
/// snapshot cannot be written.
pub fn save(state_dir: &Path, project: &Project) -> Result<PathBuf> {
    fs::create_dir_all(state_dir)?;
    let path = snapshot_path(state_dir, &project.name);
    let staged = path.with_extension("json.tmp");

    let contents = serde_json::to_string(project)?;
    fs::write(&staged, contents)?;
    fs::rename(&staged, &path)?;

    info!(path = %path.display(), issues = project.issue_count(), "wrote checkpoint");
    Ok(path)
}

/// Restore a previously saved aggregate, if one exists.
///
/// # Errors
///
/// Returns an error if an existing snapshot cannot be read or parsed.
pub fn load(state_dir: &Path, project: &str) -> Result<Option<Project>> {
    let path = snapshot_path(state_dir, project);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    let restored: Project = serde_json::from_str(&contents)?;
    info!(path = %path.display(), issues = restored.issue_count(), "restored checkpoint");
    Ok(Some(restored))
}
