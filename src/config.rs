use crate::core::score::{DEFAULT_TOP_OFFENDERS, TrackedBrowsers};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "csscompat.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub browsers: BrowsersConfig,
    pub data: DataConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub json: bool,
    pub output: String,
    /// Files scoring below this fail the run; 0 disables the gate.
    pub min_score: f64,
    pub top_offenders: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            json: false,
            output: "compatibility_results.json".to_string(),
            min_score: 0.0,
            top_offenders: DEFAULT_TOP_OFFENDERS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowsersConfig {
    pub tracked: TrackedBrowsers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub mdn_path: String,
    pub mdn_repo: String,
    pub mdn_properties_dir: String,
    pub clone_depth: i32,
    pub caniuse_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caniuse_path: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            mdn_path: "consolidated_data.json".to_string(),
            mdn_repo: "https://github.com/mdn/browser-compat-data.git".to_string(),
            mdn_properties_dir: "css/properties".to_string(),
            clone_depth: 1,
            caniuse_url: "https://raw.githubusercontent.com/Fyrd/caniuse/main/data.json"
                .to_string(),
            caniuse_path: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
    /// 0 scans files of any size.
    pub max_file_size_kb: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "node_modules".to_string(),
                "target".to_string(),
                ".git".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".nuxt".to_string(),
            ],
            extensions: vec!["css".to_string(), "vue".to_string()],
            max_file_size_kb: 512,
        }
    }
}

impl ScanConfig {
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

pub fn load_config(cli_config_path: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
    if let Some(path) = cli_config_path {
        if !path.exists() {
            bail!(
                "config file not found at {} (passed with --config)",
                path.display()
            );
        }

        return Ok(LoadedConfig {
            config: read_config(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let local_path = cwd.join(CONFIG_FILE_NAME);
    if local_path.exists() {
        return Ok(LoadedConfig {
            config: read_config(&local_path)?,
            source: Some(local_path),
        });
    }

    Ok(LoadedConfig {
        config: Config::default(),
        source: None,
    })
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "refusing to overwrite existing config file: {}",
            path.display()
        );
    }

    let content = default_config_toml()?;
    fs::write(path, content).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&Config::default()).context("failed to serialize default config")
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading config file {}", path.display()))?;
    let config = toml::from_str::<Config>(&content)
        .with_context(|| format!("failed parsing config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = default_config_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed.browsers.tracked, TrackedBrowsers::default());
        assert_eq!(parsed.general.top_offenders, 10);
        assert_eq!(parsed.data.mdn_path, "consolidated_data.json");
        assert!(parsed.data.caniuse_path.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: Config = toml::from_str(
            r#"
[browsers]
tracked = ["chrome", "firefox"]

[data]
caniuse_path = "vendor/caniuse.json"
"#,
        )
        .unwrap();

        assert_eq!(parsed.browsers.tracked.len(), 2);
        assert_eq!(parsed.data.caniuse_path.as_deref(), Some("vendor/caniuse.json"));
        assert_eq!(parsed.scan.max_file_size_kb, 512);
        assert!(parsed.scan.allows_extension("VUE"));
        assert!(!parsed.scan.allows_extension("scss"));
    }

    #[test]
    fn empty_browser_list_is_rejected() {
        let parsed = toml::from_str::<Config>("[browsers]\ntracked = []\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing), dir.path()).is_err());

        let loaded = load_config(None, dir.path()).unwrap();
        assert!(loaded.source.is_none());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_default_config(&path).unwrap();
        assert!(write_default_config(&path).is_err());
        assert!(load_config(None, dir.path()).unwrap().source.is_some());
    }
}
