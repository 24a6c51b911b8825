use anyhow::{Context, Result};
use git2::build::RepoBuilder;
use git2::{FetchOptions, Repository};
use std::path::Path;
use tracing::info;

/// Clones the default branch. A `depth` of 0 fetches full history.
pub fn clone_repository(url: &str, dest: &Path, depth: i32) -> Result<Repository> {
    let mut fetch = FetchOptions::new();
    fetch.depth(depth);

    info!(url, dest = %dest.display(), depth, "cloning repository");
    RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, dest)
        .with_context(|| format!("failed to clone {url}"))
}

pub fn head_commit(repo: &Repository) -> Result<String> {
    let head = repo.head().context("failed to resolve HEAD")?;
    let commit = head
        .peel_to_commit()
        .context("HEAD does not point to a commit")?;
    Ok(commit.id().to_string())
}
