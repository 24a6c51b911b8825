use crate::core::dataset::StatusKind;
use crate::core::error::CompatError;
use crate::core::score::{AggregateScores, BrowserScore, PropertyScore, label_for_score, round2};
use crate::utils::fs::tail_key;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::ser::{SerializeMap, SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    #[serde(serialize_with = "serialize_browser_scores")]
    pub scores: Vec<BrowserScore>,
    pub overall_score: f64,
    #[serde(serialize_with = "serialize_least_supported")]
    pub least_supported: Vec<PropertyScore>,
    #[serde(skip)]
    pub source: PathBuf,
    #[serde(skip)]
    pub resolved: usize,
    #[serde(skip)]
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CompatibilityReport {
    files: BTreeMap<String, FileReport>,
}

impl CompatibilityReport {
    /// Adds a file's scores. Files with nothing resolved are left out and
    /// `false` is returned.
    pub fn insert(&mut self, path: &Path, scores: AggregateScores) -> bool {
        if !scores.has_resolved() {
            warn!(
                "{}",
                CompatError::ZeroResolvedProperties {
                    file: path.display().to_string(),
                }
            );
            return false;
        }

        let key = tail_key(path);
        let entry = FileReport {
            scores: scores.browser_scores,
            overall_score: scores.overall_score,
            least_supported: scores.least_supported,
            source: path.to_path_buf(),
            resolved: scores.resolved,
            unresolved: scores.unresolved,
        };

        if let Some(previous) = self.files.insert(key.clone(), entry) {
            warn!(
                key = %key,
                replaced = %previous.source.display(),
                "report key collision, keeping the later file"
            );
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&FileReport> {
        self.files.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileReport)> {
        self.files.iter().map(|(key, file)| (key.as_str(), file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn summary_score(&self) -> Option<f64> {
        if self.files.is_empty() {
            return None;
        }
        let total: f64 = self.files.values().map(|file| file.overall_score).sum();
        Some(round2(total / self.files.len() as f64))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize compatibility report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }
}

fn serialize_browser_scores<S>(scores: &[BrowserScore], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(scores.len()))?;
    for entry in scores {
        map.serialize_entry(&entry.browser, &entry.score)?;
    }
    map.end()
}

// Pairs render as `["property", score]`.
fn serialize_least_supported<S>(scores: &[PropertyScore], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    struct Pair<'a>(&'a PropertyScore);

    impl Serialize for Pair<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut tuple = serializer.serialize_tuple(2)?;
            tuple.serialize_element(&self.0.property)?;
            tuple.serialize_element(&self.0.score)?;
            tuple.end()
        }
    }

    let mut seq = serializer.serialize_seq(Some(scores.len()))?;
    for entry in scores {
        seq.serialize_element(&Pair(entry))?;
    }
    seq.end()
}

#[derive(Debug, Clone)]
pub struct ExitStatus {
    pub ok: bool,
    pub reasons: Vec<String>,
}

impl ExitStatus {
    pub fn reason_line(&self) -> String {
        self.reasons.join("; ")
    }
}

pub fn evaluate_exit(report: &CompatibilityReport, min_score: f64) -> ExitStatus {
    let mut reasons = Vec::new();

    if min_score > 0.0 {
        for (key, file) in report.iter() {
            if file.overall_score < min_score {
                reasons.push(format!(
                    "{} scored {:.2}, below min_score {:.2}",
                    key, file.overall_score, min_score
                ));
            }
        }
    }

    ExitStatus {
        ok: reasons.is_empty(),
        reasons,
    }
}

fn colored_score(score: f64) -> String {
    let text = format!("{score:.2}");
    match score {
        s if s >= 90.0 => text.green().bold().to_string(),
        s if s >= 50.0 => text.yellow().bold().to_string(),
        _ => text.red().bold().to_string(),
    }
}

pub fn print_human(report: &CompatibilityReport, exit: &ExitStatus) {
    let Some(summary) = report.summary_score() else {
        println!("No CSS properties could be scored.");
        return;
    };

    println!(
        "CSS Compatibility Score: {}/100 ({}) across {} file(s)",
        colored_score(summary),
        label_for_score(summary),
        report.len()
    );

    for (key, file) in report.iter() {
        println!();
        println!(
            "{} {}/100 ({})",
            key.bold(),
            colored_score(file.overall_score),
            label_for_score(file.overall_score)
        );

        let browsers: Vec<String> = file
            .scores
            .iter()
            .map(|entry| format!("{} {}", entry.browser, colored_score(entry.score)))
            .collect();
        println!("  {}", browsers.join("  "));

        if !file.least_supported.is_empty() {
            println!("  least supported:");
            for entry in &file.least_supported {
                let status = match entry.status {
                    Some(kind) if kind != StatusKind::Standard => {
                        format!(" [{kind}]")
                    }
                    _ => String::new(),
                };
                println!(
                    "    - {} {}{}",
                    entry.property,
                    colored_score(entry.score),
                    status.dimmed()
                );
            }
        }

        if !file.unresolved.is_empty() {
            println!(
                "  {} {}",
                "no data:".dimmed(),
                file.unresolved.join(", ").dimmed()
            );
        }
    }

    println!();
    if exit.ok {
        println!("exit: OK");
    } else {
        println!("exit: FAILED ({})", exit.reason_line());
    }
}
