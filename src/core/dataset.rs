//! Typed compatibility datasets.
//!
//! Both sources are reduced to the same shape at load time: a property (or
//! caniuse feature) maps to a [`SupportTable`] of browser -> [`SupportRecord`].
//! Everything past this module works on that shape only.

use crate::core::error::CompatError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub type SupportTable = BTreeMap<String, SupportRecord>;

const MIRROR: &str = "mirror";
const MAX_MIRROR_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionAdded {
    Flag(bool),
    Version(String),
}

impl VersionAdded {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Version(version) => !version.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_added: Option<VersionAdded>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_name: Option<String>,
}

impl SupportDescriptor {
    pub fn added_in(version: impl Into<String>) -> Self {
        Self {
            version_added: Some(VersionAdded::Version(version.into())),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_alternative_name(mut self, name: impl Into<String>) -> Self {
        self.alternative_name = Some(name.into());
        self
    }

    /// Real support needs a truthy `version_added` and no vendor prefix.
    pub fn is_supported(&self) -> bool {
        let added = self
            .version_added
            .as_ref()
            .is_some_and(VersionAdded::is_truthy);
        let prefixed = self.prefix.as_deref().is_some_and(|p| !p.is_empty());
        added && !prefixed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupportRecord {
    Multiple(Vec<SupportDescriptor>),
    Single(SupportDescriptor),
}

impl SupportRecord {
    pub fn descriptors(&self) -> &[SupportDescriptor] {
        match self {
            Self::Multiple(items) => items,
            Self::Single(item) => std::slice::from_ref(item),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.descriptors().iter().any(SupportDescriptor::is_supported)
    }

    pub fn alternative_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors()
            .iter()
            .filter_map(|descriptor| descriptor.alternative_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusKind {
    Standard,
    Experimental,
    Deprecated,
    NonStandard,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Experimental => write!(f, "experimental"),
            Self::Deprecated => write!(f, "deprecated"),
            Self::NonStandard => write!(f, "non-standard"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatStatus {
    pub experimental: bool,
    pub standard_track: bool,
    pub deprecated: bool,
}

impl CompatStatus {
    pub fn kind(&self) -> StatusKind {
        if self.deprecated {
            StatusKind::Deprecated
        } else if self.experimental {
            StatusKind::Experimental
        } else if self.standard_track {
            StatusKind::Standard
        } else {
            StatusKind::NonStandard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryStatus {
    Flags(CompatStatus),
    Kind(StatusKind),
}

impl EntryStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Flags(flags) => flags.kind(),
            Self::Kind(kind) => *kind,
        }
    }
}

impl Default for EntryStatus {
    fn default() -> Self {
        Self::Flags(CompatStatus::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCompatEntry {
    pub support: SupportTable,
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mdn_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<SpecUrl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecUrl {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryDataset {
    entries: BTreeMap<String, NormalizedCompatEntry>,
}

impl PrimaryDataset {
    pub fn get(&self, property: &str) -> Option<&NormalizedCompatEntry> {
        self.entries.get(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedCompatEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn insert(&mut self, property: impl Into<String>, entry: NormalizedCompatEntry) {
        self.entries.insert(property.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(raw: &str, context: &str) -> Result<Self, CompatError> {
        serde_json::from_str(raw).map_err(|err| CompatError::schema(context, err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!(
                "failed reading primary dataset {} (run `csscompat data sync` first)",
                path.display()
            )
        })?;
        let dataset = Self::from_json_str(&raw, &path.display().to_string())?;
        debug!(properties = dataset.len(), path = %path.display(), "loaded primary dataset");
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize primary dataset")?;
        fs::write(path, content).with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }
}

/// Normalizes one browser-compat-data property file.
///
/// Only the first key under `css.properties` is kept.
pub fn normalize_record(
    raw: &Value,
    context: &str,
) -> Result<(String, NormalizedCompatEntry), CompatError> {
    let properties = raw
        .get("css")
        .and_then(|css| css.get("properties"))
        .and_then(Value::as_object)
        .ok_or_else(|| CompatError::schema(context, "missing css.properties object"))?;

    let mut iter = properties.iter();
    let Some((name, body)) = iter.next() else {
        return Err(CompatError::schema(context, "css.properties is empty"));
    };

    let dropped: Vec<&str> = iter.map(|(key, _)| key.as_str()).collect();
    if !dropped.is_empty() {
        warn!(
            file = context,
            kept = %name,
            dropped = ?dropped,
            "record holds more than one property, keeping the first"
        );
    }

    let compat = body
        .get("__compat")
        .and_then(Value::as_object)
        .ok_or_else(|| CompatError::schema(context, format!("{name} has no __compat block")))?;

    let raw_support = compat
        .get("support")
        .and_then(Value::as_object)
        .ok_or_else(|| CompatError::schema(context, format!("{name} has no support table")))?;

    let support = resolve_support_table(raw_support, context)?;
    let status = match compat.get("status") {
        Some(value) => serde_json::from_value::<EntryStatus>(value.clone())
            .map_err(|err| CompatError::schema(context, format!("{name} status: {err}")))?,
        None => EntryStatus::default(),
    };
    let mdn_url = compat
        .get("mdn_url")
        .and_then(Value::as_str)
        .map(str::to_string);
    let spec_url = match compat.get("spec_url") {
        Some(value) => Some(
            serde_json::from_value::<SpecUrl>(value.clone())
                .map_err(|err| CompatError::schema(context, format!("{name} spec_url: {err}")))?,
        ),
        None => None,
    };

    Ok((
        name.clone(),
        NormalizedCompatEntry {
            support,
            status,
            mdn_url,
            spec_url,
        },
    ))
}

pub fn normalize_dir(dir: &Path) -> Result<PrimaryDataset> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("failed listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut dataset = PrimaryDataset::default();
    for path in files {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?;
        let (name, entry) = normalize_record(&value, &path.display().to_string())?;
        dataset.insert(name, entry);
    }

    Ok(dataset)
}

// Source files abbreviate some browsers as "mirror" of an upstream engine.
fn mirror_upstream(browser: &str) -> Option<&'static str> {
    match browser {
        "edge" | "opera" | "chrome_android" => Some("chrome"),
        "opera_android" | "samsunginternet_android" | "webview_android" => {
            Some("chrome_android")
        }
        "firefox_android" => Some("firefox"),
        "safari_ios" => Some("safari"),
        "webview_ios" => Some("safari_ios"),
        _ => None,
    }
}

fn resolve_support_table(
    raw: &Map<String, Value>,
    context: &str,
) -> Result<SupportTable, CompatError> {
    let mut table = SupportTable::new();
    let mut mirrored = Vec::new();

    for (browser, value) in raw {
        match value {
            Value::String(marker) if marker == MIRROR => mirrored.push(browser.as_str()),
            _ => {
                let record = serde_json::from_value::<SupportRecord>(value.clone())
                    .map_err(|err| CompatError::schema(context, format!("{browser}: {err}")))?;
                table.insert(browser.clone(), record);
            }
        }
    }

    // Chains like webview_ios -> safari_ios -> safari settle within a few passes.
    for _ in 0..MAX_MIRROR_DEPTH {
        if mirrored.is_empty() {
            break;
        }
        mirrored.retain(|browser| {
            let upstream = mirror_upstream(browser).and_then(|up| table.get(up)).cloned();
            match upstream {
                Some(record) => {
                    table.insert(browser.to_string(), mirror_record(&record));
                    false
                }
                None => true,
            }
        });
    }

    for browser in mirrored {
        debug!(file = context, browser, "mirror target unavailable, leaving browser absent");
    }

    Ok(table)
}

// Upstream version numbers do not carry over to the downstream browser.
fn mirror_record(upstream: &SupportRecord) -> SupportRecord {
    let descriptors = upstream
        .descriptors()
        .iter()
        .map(|descriptor| SupportDescriptor {
            version_added: descriptor
                .version_added
                .as_ref()
                .map(|added| VersionAdded::Flag(added.is_truthy())),
            ..descriptor.clone()
        })
        .collect();
    SupportRecord::Multiple(descriptors)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CanIUseAgent {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanIUseEntry {
    #[serde(default)]
    pub stats: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanIUseData {
    #[serde(default)]
    pub agents: BTreeMap<String, CanIUseAgent>,
    pub data: BTreeMap<String, CanIUseEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryDataset {
    features: BTreeMap<String, SupportTable>,
}

impl SecondaryDataset {
    pub fn get(&self, feature: &str) -> Option<&SupportTable> {
        self.features.get(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_json_str(raw: &str, context: &str) -> Result<Self, CompatError> {
        let data: CanIUseData =
            serde_json::from_str(raw).map_err(|err| CompatError::schema(context, err.to_string()))?;
        Ok(Self::from_caniuse(&data))
    }

    pub fn from_caniuse(raw: &CanIUseData) -> Self {
        let features = raw
            .data
            .iter()
            .map(|(feature, entry)| {
                let table = entry
                    .stats
                    .iter()
                    .map(|(browser, versions)| {
                        let prefix = raw
                            .agents
                            .get(browser)
                            .and_then(|agent| agent.prefix.as_deref());
                        (browser.clone(), adapt_stats(versions, prefix))
                    })
                    .collect();
                (feature.clone(), table)
            })
            .collect();

        Self { features }
    }
}

/// First full-support version, unprefixed and prefixed, in document order.
fn adapt_stats(versions: &Map<String, Value>, agent_prefix: Option<&str>) -> SupportRecord {
    let mut unprefixed = None;
    let mut prefixed = None;

    for (version, flag) in versions {
        let Some(flag) = flag.as_str() else {
            continue;
        };
        let mut tokens = flag.split_whitespace();
        if tokens.next() != Some("y") {
            continue;
        }
        let rest: Vec<&str> = tokens.collect();
        if rest.contains(&"d") {
            continue;
        }

        if rest.contains(&"x") {
            prefixed.get_or_insert_with(|| {
                SupportDescriptor::added_in(version.as_str())
                    .with_prefix(format!("-{}-", agent_prefix.unwrap_or("x")))
            });
        } else {
            unprefixed.get_or_insert_with(|| SupportDescriptor::added_in(version.as_str()));
        }
    }

    SupportRecord::Multiple(unprefixed.into_iter().chain(prefixed).collect())
}
