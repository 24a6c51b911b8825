use crate::config::Config;
use crate::core::dataset::{PrimaryDataset, SecondaryDataset};
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

pub mod caniuse;
pub mod mdn;

#[derive(Debug, Clone)]
pub struct Datasets {
    pub primary: PrimaryDataset,
    pub secondary: SecondaryDataset,
}

impl Datasets {
    pub fn load(cfg: &Config, base: &Path) -> Result<Self> {
        let primary = PrimaryDataset::load(&base.join(&cfg.data.mdn_path))?;
        let secondary = match &cfg.data.caniuse_path {
            Some(path) => caniuse::load_file(&base.join(path))?,
            None => caniuse::fetch(
                &cfg.data.caniuse_url,
                Duration::from_secs(cfg.data.timeout_secs),
            )?,
        };

        Ok(Self { primary, secondary })
    }
}
