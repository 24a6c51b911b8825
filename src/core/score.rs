use crate::core::dataset::StatusKind;
use crate::core::resolver::SupportResolver;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub const DEFAULT_BROWSERS: [&str; 5] = ["chrome", "firefox", "safari", "edge", "opera"];
pub const DEFAULT_TOP_OFFENDERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TrackedBrowsers(Vec<String>);

impl TrackedBrowsers {
    pub fn new<I, S>(browsers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut list = Vec::new();
        for browser in browsers {
            let browser = browser.as_ref().trim().to_ascii_lowercase();
            if browser.is_empty() {
                continue;
            }
            if seen.insert(browser.clone()) {
                list.push(browser);
            }
        }

        if list.is_empty() {
            bail!("at least one tracked browser is required");
        }
        Ok(Self(list))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for TrackedBrowsers {
    fn default() -> Self {
        Self(DEFAULT_BROWSERS.iter().map(|b| b.to_string()).collect())
    }
}

impl TryFrom<Vec<String>> for TrackedBrowsers {
    type Error = anyhow::Error;

    fn try_from(value: Vec<String>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TrackedBrowsers> for Vec<String> {
    fn from(value: TrackedBrowsers) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyScore {
    pub property: String,
    pub score: f64,
    pub status: Option<StatusKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserScore {
    pub browser: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScores {
    pub browser_scores: Vec<BrowserScore>,
    pub overall_score: f64,
    pub least_supported: Vec<PropertyScore>,
    pub resolved: usize,
    pub unresolved: Vec<String>,
}

impl AggregateScores {
    pub fn has_resolved(&self) -> bool {
        self.resolved > 0
    }
}

/// Scores a property set against the tracked browsers.
///
/// Unresolved properties are left out of every count. When nothing
/// resolves, all scores are 0 and `resolved` is 0.
pub fn aggregate(
    properties: &BTreeSet<String>,
    resolver: &SupportResolver<'_>,
    browsers: &TrackedBrowsers,
    top_n: usize,
) -> AggregateScores {
    let mut supported_counts = vec![0_usize; browsers.len()];
    let mut property_scores = Vec::new();
    let mut unresolved = Vec::new();

    for property in properties {
        let resolution = match resolver.resolve_property(property) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!("{err}");
                unresolved.push(property.clone());
                continue;
            }
        };
        debug!(property = %property, path = %resolution.path, "resolved");

        let mut supported = 0_usize;
        for (count, browser) in supported_counts.iter_mut().zip(browsers.iter()) {
            if resolution.supports(browser) {
                *count += 1;
                supported += 1;
            }
        }

        property_scores.push(PropertyScore {
            property: property.clone(),
            score: supported as f64 / browsers.len() as f64 * 100.0,
            status: resolution.status,
        });
    }

    let resolved = property_scores.len();
    let browser_scores: Vec<BrowserScore> = browsers
        .iter()
        .zip(&supported_counts)
        .map(|(browser, count)| BrowserScore {
            browser: browser.to_string(),
            score: if resolved == 0 {
                0.0
            } else {
                round2(*count as f64 / resolved as f64 * 100.0)
            },
        })
        .collect();

    let overall_score = round2(
        browser_scores.iter().map(|entry| entry.score).sum::<f64>() / browsers.len() as f64,
    );

    AggregateScores {
        browser_scores,
        overall_score,
        least_supported: worst_offenders(property_scores, top_n),
        resolved,
        unresolved,
    }
}

fn worst_offenders(mut scores: Vec<PropertyScore>, top_n: usize) -> Vec<PropertyScore> {
    scores.retain(|entry| entry.score < 100.0);
    scores.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.property.cmp(&b.property))
    });
    scores.truncate(top_n);
    scores
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn label_for_score(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "Excellent",
        s if s >= 75.0 => "Good",
        s if s >= 50.0 => "Fair",
        _ => "At Risk",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{PrimaryDataset, SecondaryDataset};

    fn primary(raw: &str) -> PrimaryDataset {
        PrimaryDataset::from_json_str(raw, "test").unwrap()
    }

    fn props(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    // chrome, firefox, safari, edge, opera: `n` of them supported.
    fn supported_by(n: usize) -> String {
        let body: Vec<String> = DEFAULT_BROWSERS
            .iter()
            .take(n)
            .map(|browser| format!(r#""{browser}": {{"version_added": "1"}}"#))
            .collect();
        format!(r#"{{"support": {{{}}}, "status": {{}}}}"#, body.join(","))
    }

    #[test]
    fn end_to_end_two_browsers() {
        let primary = primary(
            r#"{"display": {"support": {"chrome": {"version_added": "1"}, "firefox": {"version_added": "1"}}, "status": "standard"}}"#,
        );
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);
        let browsers = TrackedBrowsers::new(["chrome", "firefox"]).unwrap();

        let result = aggregate(&props(&["display"]), &resolver, &browsers, 10);

        assert_eq!(
            result.browser_scores,
            vec![
                BrowserScore { browser: "chrome".into(), score: 100.0 },
                BrowserScore { browser: "firefox".into(), score: 100.0 },
            ]
        );
        assert_eq!(result.overall_score, 100.0);
        assert!(result.least_supported.is_empty());
    }

    #[test]
    fn fully_supported_property_is_not_an_offender() {
        let primary = primary(&format!(r#"{{"color": {}}}"#, supported_by(5)));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        let result = aggregate(&props(&["color"]), &resolver, &TrackedBrowsers::default(), 10);
        assert_eq!(result.resolved, 1);
        assert_eq!(result.overall_score, 100.0);
        assert!(result.least_supported.is_empty());
    }

    #[test]
    fn unresolved_only_input_yields_zero_result() {
        let primary = primary(&format!(r#"{{"color": {}}}"#, supported_by(5)));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        let result = aggregate(&props(&["not-a-property"]), &resolver, &TrackedBrowsers::default(), 10);
        assert_eq!(result.resolved, 0);
        assert!(!result.has_resolved());
        assert_eq!(result.unresolved, vec!["not-a-property".to_string()]);
        assert!(result.browser_scores.iter().all(|entry| entry.score == 0.0));
        assert_eq!(result.overall_score, 0.0);
        assert!(result.least_supported.is_empty());
    }

    #[test]
    fn unresolved_properties_do_not_dilute_scores() {
        let primary = primary(&format!(r#"{{"color": {}}}"#, supported_by(5)));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        let result = aggregate(&props(&["color", "bogus"]), &resolver, &TrackedBrowsers::default(), 10);
        assert_eq!(result.resolved, 1);
        assert_eq!(result.overall_score, 100.0);
    }

    #[test]
    fn offenders_sorted_by_score_then_name() {
        let primary = primary(&format!(
            r#"{{"b-eighty": {}, "z-sixty": {}, "full": {}, "a-sixty": {}}}"#,
            supported_by(4),
            supported_by(3),
            supported_by(5),
            supported_by(3)
        ));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        let result = aggregate(
            &props(&["b-eighty", "z-sixty", "full", "a-sixty"]),
            &resolver,
            &TrackedBrowsers::default(),
            10,
        );

        let order: Vec<(&str, f64)> = result
            .least_supported
            .iter()
            .map(|entry| (entry.property.as_str(), entry.score))
            .collect();
        assert_eq!(
            order,
            vec![("a-sixty", 60.0), ("z-sixty", 60.0), ("b-eighty", 80.0)]
        );
        // edge: b-eighty and full; opera: full only.
        assert_eq!(result.browser_scores[3].score, 50.0);
        assert_eq!(result.browser_scores[4].score, 25.0);
        assert_eq!(result.overall_score, 75.0);
    }

    #[test]
    fn offenders_are_capped() {
        let names: Vec<String> = (0..15).map(|i| format!("prop-{i:02}")).collect();
        let body: Vec<String> = names
            .iter()
            .map(|name| format!(r#""{name}": {}"#, supported_by(2)))
            .collect();
        let primary = primary(&format!("{{{}}}", body.join(",")));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);
        let set: BTreeSet<String> = names.iter().cloned().collect();

        let result = aggregate(&set, &resolver, &TrackedBrowsers::default(), DEFAULT_TOP_OFFENDERS);
        assert_eq!(result.least_supported.len(), 10);
        assert_eq!(result.least_supported[0].property, "prop-00");
    }

    #[test]
    fn aggregation_is_repeatable() {
        let primary = primary(&format!(
            r#"{{"gap": {}, "color": {}}}"#,
            supported_by(2),
            supported_by(5)
        ));
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);
        let set = props(&["gap", "color", "unknown"]);

        let first = aggregate(&set, &resolver, &TrackedBrowsers::default(), 10);
        let second = aggregate(&set, &resolver, &TrackedBrowsers::default(), 10);
        assert_eq!(first, second);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(200.0 / 3.0), 66.67);
    }

    #[test]
    fn tracked_browsers_normalize_and_reject_empty() {
        let browsers = TrackedBrowsers::new(["Chrome", "firefox", "chrome", " "]).unwrap();
        assert_eq!(browsers.iter().collect::<Vec<_>>(), vec!["chrome", "firefox"]);
        assert!(TrackedBrowsers::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(label_for_score(95.0), "Excellent");
        assert_eq!(label_for_score(80.0), "Good");
        assert_eq!(label_for_score(50.0), "Fair");
        assert_eq!(label_for_score(12.5), "At Risk");
    }
}
