use crate::core::dataset::SecondaryDataset;
use crate::core::error::CompatError;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub fn fetch(url: &str, timeout: Duration) -> Result<SecondaryDataset, CompatError> {
    let unavailable = |reason: String| CompatError::SecondaryDatasetUnavailable {
        url: url.to_string(),
        reason,
    };

    info!(url, "fetching compatibility data");
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("csscompat/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| unavailable(err.to_string()))?;

    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|err| unavailable(err.to_string()))?;
    debug!(bytes = body.len(), "compatibility data downloaded");

    SecondaryDataset::from_json_str(&body, url).map_err(|err| unavailable(err.to_string()))
}

pub fn load_file(path: &Path) -> Result<SecondaryDataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading caniuse data {}", path.display()))?;
    let dataset = SecondaryDataset::from_json_str(&raw, &path.display().to_string())?;
    debug!(features = dataset.len(), path = %path.display(), "loaded secondary dataset");
    Ok(dataset)
}
