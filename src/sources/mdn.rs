//! Builds the consolidated primary dataset from browser-compat-data.

use crate::core::dataset::{PrimaryDataset, normalize_dir};
use crate::utils::git;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub properties: usize,
    pub commit: Option<String>,
    pub output: PathBuf,
}

/// Clones `repo_url` into a temporary checkout and normalizes
/// `<checkout>/<properties_dir>`. The checkout is removed afterwards.
pub fn sync_from_repo(
    repo_url: &str,
    properties_dir: &str,
    depth: i32,
    output: &Path,
) -> Result<SyncSummary> {
    let checkout = tempfile::tempdir().context("failed to create temporary checkout")?;
    let clone_path = checkout.path().join("browser-compat-data");
    let repo = git::clone_repository(repo_url, &clone_path, depth)?;
    let commit = git::head_commit(&repo).ok();

    let mut summary = sync_from_dir(&clone_path.join(properties_dir), output)?;
    summary.commit = commit;
    Ok(summary)
}

pub fn sync_from_dir(properties_dir: &Path, output: &Path) -> Result<SyncSummary> {
    if !properties_dir.is_dir() {
        bail!(
            "properties directory not found: {}",
            properties_dir.display()
        );
    }

    let dataset: PrimaryDataset = normalize_dir(properties_dir)?;
    if dataset.is_empty() {
        bail!(
            "no property records found in {}",
            properties_dir.display()
        );
    }

    dataset.save(output)?;
    info!(
        properties = dataset.len(),
        output = %output.display(),
        "primary dataset written"
    );

    Ok(SyncSummary {
        properties: dataset.len(),
        commit: None,
        output: output.to_path_buf(),
    })
}
